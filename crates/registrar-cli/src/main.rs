use clap::{Parser, Subcommand};
use dialoguer::Input;
use dotenvy::dotenv;
use registrar_cli::admin;
use registrar_cli::seeder::{self, CatalogPerDepartment, SeedConfig, SlotsConfig};
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "registrar-cli")]
#[command(about = "Registrar CLI - Administrative tools for Registrar", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin account, or promote an existing user to admin
    CreateAdmin {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Subject of the user at the identity provider
        #[arg(short = 'i', long)]
        identity_ref: Option<String>,

        /// Display name
        #[arg(short = 'n', long)]
        name: Option<String>,
    },
    /// Seed levels, a fake catalog and screening slots
    Seed {
        /// Number of departments to create
        #[arg(short = 'd', long, default_value = "4")]
        departments: usize,

        /// Number of programs per department
        #[arg(long, default_value = "3")]
        programs: usize,

        /// Number of teachers per department
        #[arg(long, default_value = "6")]
        teachers: usize,

        /// Number of courses per program
        #[arg(long, default_value = "8")]
        courses: usize,

        /// Number of weekdays to create screening slots for
        #[arg(long, default_value = "10")]
        slot_days: usize,
    },
    /// Seed only screening slots
    SeedSlots {
        /// Number of weekdays to create screening slots for
        #[arg(long, default_value = "10")]
        days: usize,

        /// Seats per slot
        #[arg(long, default_value = "50")]
        capacity: i32,
    },
    /// Clear seeded catalog and scheduling data (keeps users, students and levels)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let pool = match registrar_db::init_db_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateAdmin {
            email,
            identity_ref,
            name,
        } => handle_create_admin(&pool, email, identity_ref, name).await,
        Commands::Seed {
            departments,
            programs,
            teachers,
            courses,
            slot_days,
        } => {
            let config = SeedConfig::new(departments)
                .with_catalog(CatalogPerDepartment {
                    programs,
                    teachers,
                    courses_per_program: courses,
                })
                .with_slots(SlotsConfig {
                    days: slot_days,
                    ..Default::default()
                });
            handle_seed(&pool, config).await
        }
        Commands::SeedSlots { days, capacity } => handle_seed_slots(&pool, days, capacity).await,
        Commands::ClearSeed => handle_clear_seed(&pool).await,
    }
}

fn prompt(label: &str) -> String {
    match Input::new().with_prompt(label).interact_text() {
        Ok(value) => value,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", label.to_lowercase(), e);
            std::process::exit(1);
        }
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    email: Option<String>,
    identity_ref: Option<String>,
    name: Option<String>,
) {
    let email = email.unwrap_or_else(|| prompt("Email address"));
    let identity_ref = identity_ref.unwrap_or_else(|| prompt("Identity reference"));

    match admin::create_admin(pool, &email, &identity_ref, name.as_deref()).await {
        Ok(user) => {
            println!("\n✅ Admin ready!");
            println!("   Id: {}", user.id);
            println!("   Email: {}", user.email);
            if let Some(name) = user.name {
                println!("   Name: {}", name);
            }
        }
        Err(e) => {
            eprintln!("\n❌ Error creating admin: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_seed(pool: &PgPool, config: SeedConfig) {
    if let Err(e) = seeder::seed_all(pool, config).await {
        eprintln!("\n❌ Error seeding database: {}", e);
        std::process::exit(1);
    }
}

async fn handle_seed_slots(pool: &PgPool, days: usize, capacity: i32) {
    if capacity <= 0 {
        eprintln!("❌ Capacity must be positive");
        std::process::exit(1);
    }

    let config = SlotsConfig {
        days,
        max_capacity: capacity,
        ..Default::default()
    };

    match seeder::slots::seed_slots(pool, &config).await {
        Ok(count) => println!("✅ Created {} screening slots", count),
        Err(e) => {
            eprintln!("\n❌ Error seeding screening slots: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_clear_seed(pool: &PgPool) {
    if let Err(e) = seeder::clear_all(pool).await {
        eprintln!("\n❌ Error clearing seeded data: {}", e);
        std::process::exit(1);
    }
}
