use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use escola_cli::seeder::{self, MembersPerSchool, SeedConfig};
use escola_cli::sysadmin::{SystemAdminInput, create_system_admin, default_username};
use sqlx::PgPool;
use std::error::Error;

#[derive(Parser)]
#[command(name = "escola-cli")]
#[command(about = "Escola CLI - Administrative tools for Escola", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new system administrator account
    CreateSysadmin {
        /// First name of the system admin
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the system admin
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Login name (defaults to the email's local part)
        #[arg(short = 'u', long)]
        username: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake schools, classes, people and enrollments
    Seed {
        /// Number of schools to create
        #[arg(short = 's', long, default_value = "3")]
        schools: usize,

        /// Number of office staff per school
        #[arg(long, default_value = "3")]
        staff: usize,

        /// Number of teachers per school
        #[arg(long, default_value = "8")]
        teachers: usize,

        /// Number of students per school
        #[arg(long, default_value = "60")]
        students: usize,

        /// Number of classes per course
        #[arg(long, default_value = "2")]
        classes: usize,
    },
    /// Clear all seeded data (keeps system admins)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("\n❌ {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .map_err(|e| format!("Failed to connect to database: {e}"))?;

    match cli.command {
        Commands::CreateSysadmin {
            first_name,
            last_name,
            email,
            username,
            password,
        } => handle_create_sysadmin(&pool, first_name, last_name, email, username, password).await,
        Commands::Seed {
            schools,
            staff,
            teachers,
            students,
            classes,
        } => {
            let config = SeedConfig::new(schools)
                .with_members(MembersPerSchool {
                    staff,
                    teachers,
                    students,
                })
                .with_classes_per_course(classes);
            seeder::seed_all(&pool, &config).await.map(|_| ())
        }
        Commands::ClearSeed => seeder::clear_all(&pool).await.map(|_| ()),
    }
}

fn prompt_or(value: Option<String>, prompt: &str) -> Result<String, dialoguer::Error> {
    match value {
        Some(value) => Ok(value),
        None => Input::new().with_prompt(prompt).interact_text(),
    }
}

async fn handle_create_sysadmin(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let first_name = prompt_or(first_name, "First name")?;
    let last_name = prompt_or(last_name, "Last name")?;
    let email = prompt_or(email, "Email address")?;
    let username = match username {
        Some(username) => username,
        None => Input::new()
            .with_prompt("Username")
            .default(default_username(&email))
            .interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    let input = SystemAdminInput {
        first_name: &first_name,
        last_name: &last_name,
        email: &email,
        username: &username,
        password: &password,
    };
    create_system_admin(pool, &input).await?;

    println!("\n✅ System admin created successfully!");
    println!("   Username: {}", username.trim().to_lowercase());
    println!("   Name: {} {}", first_name, last_name);
    Ok(())
}
