mod category;
pub mod dao;
mod ingredient;
mod recipe;
mod recipe_ingredient;
mod review;
mod role;
pub mod sqlite;
mod user;

pub use category::{Category, CategoryDao, CategoryWithCount};
pub use dao::{Dao, Fields};
pub use ingredient::{Ingredient, IngredientDao, IngredientUse, IngredientWithUsage};
pub use recipe::{Recipe, RecipeDao, RecipeDetails, RecipeSummary, DIFFICULTY_LEVELS};
pub use recipe_ingredient::{
    RecipeIngredient, RecipeIngredientDao, RecipeIngredientLine, RecipeIngredientUse,
};
pub use review::{RatingStats, RecentReview, Review, ReviewDao, ReviewWithRecipe, ReviewWithUser};
pub use role::{Role, RoleDao, ADMIN_ROLE, DEFAULT_ROLE_ID};
pub use sqlite::SqliteStorage;
pub use user::{User, UserDao, UserWithRole};
