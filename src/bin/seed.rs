use clap::Parser;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use sqlx::sqlite::SqlitePoolOptions;

use gymbook::{
    auth::AuthService,
    domain::GymStatus,
    repository::{
        GymRepository, SqliteGymRepository, SqliteUserRepository, UserRepository,
    },
};

#[derive(Parser)]
#[command(about = "Seed the GymBook database with demo gyms and users")]
struct Args {
    /// Number of demo users to create
    #[arg(long, default_value_t = 5)]
    users: usize,

    /// Number of demo gyms to create
    #[arg(long, default_value_t = 3)]
    gyms: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:gymbook.db".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let gym_repo = SqliteGymRepository::new(db_pool.clone());

    println!("🏋️ Creating gyms...");
    for i in 0..args.gyms {
        let name: String = CompanyName().fake();
        // Leave one inactive so the gym-active check is exercisable locally.
        let status = if i == args.gyms - 1 && args.gyms > 1 {
            GymStatus::Inactive
        } else {
            GymStatus::Active
        };
        let gym = gym_repo.create(&format!("{} Fitness", name), status).await?;
        println!("  ✅ Gym {} ({:?})", gym.name, gym.status);
    }

    println!("👥 Creating users...");
    let demo_hash = AuthService::hash_password("password123").await?;

    let demo = user_repo
        .create("demo@gymbook.local", &demo_hash, "Demo User")
        .await?;
    println!("  ✅ Created demo user ({} / password123)", demo.email);

    for _ in 0..args.users {
        let email: String = SafeEmail().fake();
        let full_name: String = Name().fake();
        let user = user_repo.create(&email, &demo_hash, &full_name).await?;
        println!("  ✅ Created user {}", user.email);
    }

    println!("🎉 Seeding complete!");

    Ok(())
}
