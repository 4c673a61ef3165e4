mod access;
mod crud;
mod usage_guards;
