use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum AdminCmd {
    #[command(
        about = "Create or promote an admin user",
        long_about = "Create a user with the admin role. If the email is already registered the user is promoted to admin and its password is replaced."
    )]
    Create {
        #[arg(long, value_name = "NAME", help = "Display name")]
        name: String,
        #[arg(long, value_name = "EMAIL", help = "Login email")]
        email: String,
        #[arg(
            long,
            env = "RECIPE_API_ADMIN_PASSWORD",
            value_name = "PASSWORD",
            help = "Login password (at least 6 characters)"
        )]
        password: String,
    },
}
