//! ormlet CLI - connection bootstrap and smoke checks
//!
//! Usage:
//!   ormlet ping                         Connect and run `select 1`
//!   ormlet demo                         Save, find, count and remove a demo user
//!   ormlet demo --keep                  Leave the demo user in place
//!   ormlet --host db --user u --password p --database awesome ping
//!
//! Connection flags fall back to the ORMLET_DB_* environment variables
//! (ORMLET_DB_HOST, ORMLET_DB_PORT, ORMLET_DB_USER, ORMLET_DB_PASSWORD,
//! ORMLET_DB_NAME, ORMLET_DB_CHARSET, ORMLET_DB_AUTOCOMMIT,
//! ORMLET_DB_MAX_POOL, ORMLET_DB_MIN_POOL).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use ormlet::{ConnectionConfig, Database, Entity, Field, FindOptions, Model, Schema, SchemaBuilder, Value};

#[derive(Parser)]
#[command(name = "ormlet")]
#[command(about = "ormlet database bootstrap", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Database host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Database port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Database user
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Database password
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Database name
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Connection character set
    #[arg(long, global = true)]
    charset: Option<String>,

    /// Maximum pool size
    #[arg(long, global = true)]
    max_pool_size: Option<u32>,

    /// Minimum pool size
    #[arg(long, global = true)]
    min_pool_size: Option<u32>,
}

impl ConnectionArgs {
    /// Environment first, then flags on top.
    fn into_config(self) -> Result<ConnectionConfig> {
        let mut config = ConnectionConfig::from_env().context("Invalid ORMLET_DB_* environment")?;

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.user.is_some() {
            config.user = self.user;
        }
        if self.password.is_some() {
            config.password = self.password;
        }
        if self.database.is_some() {
            config.database = self.database;
        }
        if let Some(charset) = self.charset {
            config.charset = charset;
        }
        if let Some(max) = self.max_pool_size {
            config.max_pool_size = max;
        }
        if let Some(min) = self.min_pool_size {
            config.min_pool_size = min;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and verify the database answers
    Ping,
    /// Round-trip a demo user through the `users` table
    Demo {
        /// Create the `users` table if it does not exist
        #[arg(long)]
        create_table: bool,

        /// Keep the saved user instead of removing it
        #[arg(long)]
        keep: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = cli.connection.into_config()?;
    let db = Database::connect(config)
        .await
        .context("Failed to create database connection pool")?;

    let outcome = match cli.command {
        Commands::Ping => ping(&db).await,
        Commands::Demo { create_table, keep } => demo(&db, create_table, keep).await,
    };

    db.close().await;
    outcome
}

async fn ping(db: &Database) -> Result<()> {
    db.ping().await.context("Ping failed")?;
    println!("ok");
    Ok(())
}

// =============================================================================
// Demo
// =============================================================================

const CREATE_USERS: &str = "create table if not exists `users` (
    `id` varchar(50) not null,
    `email` varchar(50) not null,
    `passwd` varchar(50) not null,
    `admin` bool not null,
    `name` varchar(50) not null,
    `image` varchar(500) not null,
    `created_at` real not null,
    unique key `idx_email` (`email`),
    key `idx_created_at` (`created_at`),
    primary key (`id`)
) engine=innodb default charset=utf8";

struct UserModel;

impl Model for UserModel {
    fn declare() -> SchemaBuilder {
        Schema::builder("User")
            .table("users")
            .field(Field::string("id").ddl("varchar(50)").primary_key().default_with(next_id))
            .field(Field::string("email").ddl("varchar(50)"))
            .field(Field::string("passwd").ddl("varchar(50)"))
            .field(Field::boolean("admin"))
            .field(Field::string("name").ddl("varchar(50)"))
            .field(Field::string("image").ddl("varchar(500)"))
            .field(Field::float("created_at").default_with(now_seconds))
    }

    ormlet::model_cell!();
}

type User = Entity<UserModel>;

/// Time-ordered 50 character key: 15 digits of epoch millis, a v4 UUID, `000`.
fn next_id() -> Value {
    let millis = chrono::Utc::now().timestamp_millis();
    Value::from(format!("{:015}{}000", millis, Uuid::new_v4().simple()))
}

fn now_seconds() -> Value {
    let now = chrono::Utc::now();
    Value::Float(now.timestamp_millis() as f64 / 1000.0)
}

async fn demo(db: &Database, create_table: bool, keep: bool) -> Result<()> {
    let schema = UserModel::register()?;
    info!("demo model {} mapped to table {}", schema.model_name(), schema.table());

    if create_table {
        db.execute(CREATE_USERS, &[]).await.context("Failed to create users table")?;
    }

    let tag = Uuid::new_v4().simple().to_string();
    let mut user = User::from_values([
        ("name", Value::from("Test")),
        ("email", Value::from(format!("test-{}@example.com", &tag[..8]))),
        ("passwd", Value::from("1234567890")),
        ("image", Value::from("about:blank")),
    ])?;
    let affected = user.save(db).await?;
    println!("saved {} (affected rows: {})", user, affected);

    let id = user
        .primary_key_value()
        .cloned()
        .context("Saved user has no primary key")?;
    let found = User::find(db, id).await?.context("Saved user not found")?;
    println!("{}", serde_json::to_string_pretty(&found.to_json())?);

    let recent = User::find_all(db, FindOptions::new().order_by("`created_at` desc").limit(5)).await?;
    println!("most recent users: {}", recent.len());

    let total = User::find_number(db, "count(`id`)", None, Vec::new()).await?;
    println!("total users: {}", total.unwrap_or(Value::Int(0)));

    if !keep {
        found.remove(db).await?;
        println!("removed {}", found);
    }

    Ok(())
}

/// Initialize logging based on log level
fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized

    Ok(())
}
