use anyhow::Result;
use clap::{Parser, Subcommand};
use client::{UserApi, UserService, UserStore, DEFAULT_BASE_URL};
use shared::{NewUser, Sex, User, UserChanges};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "users", about = "Manage users through the users api")]
struct Cli {
    /// Users collection endpoint.
    #[arg(long, env = "USERS_API_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every user, newest first
    List,
    /// Show a single user
    Get { id: i64 },
    /// Create a user
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value_t = Sex::Male)]
        sex: Sex,
    },
    /// Change some fields of a user
    Edit {
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        sex: Option<Sex>,
    },
    /// Delete a user
    Remove { id: i64 },
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users");
        return;
    }
    for user in users {
        print_user(user);
    }
}

fn print_user(user: &User) {
    println!(
        "{:>5}  {:<15} {:<15} {:<15} {:<6}  {}",
        user.id, user.first_name, user.last_name, user.phone, user.sex, user.created_at
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("client=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let service = UserService::new(reqwest::Client::new(), cli.base_url);
    let store = UserStore::new(service);

    match cli.command {
        Command::List => {
            store.load().await?;
        }
        Command::Get { id } => {
            let user = store.api().fetch_user(id).await?;
            print_user(&user);
            return Ok(());
        }
        Command::Add {
            first_name,
            last_name,
            phone,
            sex,
        } => {
            let user = store
                .add(&NewUser {
                    first_name,
                    last_name,
                    phone,
                    sex,
                })
                .await?;
            println!("Created user {}", user.id);
        }
        Command::Edit {
            id,
            first_name,
            last_name,
            phone,
            sex,
        } => {
            let changes = UserChanges {
                first_name,
                last_name,
                phone,
                sex,
            };
            store.edit(id, &changes).await?;
            println!("Updated user {id}");
        }
        Command::Remove { id } => {
            store.remove(id).await?;
            println!("Deleted user {id}");
        }
    }

    print_users(&store.users());

    Ok(())
}
