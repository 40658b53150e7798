use std::net::SocketAddr;

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use folio::auth;
use folio::config::{Cli, Command, Config, ScaffoldArgs, ScaffoldParams, UserCommand};
use folio::db;
use folio::db::models::User;
use folio::repository::UserRepository;
use folio::scaffold::{self, TemplateSet};
use folio::state::{AppState, DbPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    match cli.command {
        Command::Serve => serve(&cli, config).await,
        Command::Scaffold(ref args) => generate(args, &config).await,
        Command::ScaffoldCheck(ref params) => check_templates(params, &config).await,
        Command::User(ref command) => manage_user(command, &cli, config).await,
    }
}

fn open_database(cli: &Cli, config: &Config) -> anyhow::Result<DbPool> {
    let data_dir = Config::data_dir(cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;
    Ok(pool)
}

async fn serve(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let pool = open_database(cli, &config)?;
    let purged = auth::purge_expired_sessions(&pool)?;
    if purged > 0 {
        tracing::info!("Removed {} expired sessions", purged);
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = folio::routes::router(AppState::new(pool, config));

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn load_templates(params: &ScaffoldParams, config: &Config) -> anyhow::Result<TemplateSet> {
    let dir = params
        .templates
        .as_deref()
        .or(config.scaffold.templates_dir.as_deref());
    let set = TemplateSet::load(dir).await?;
    for template in set.iter() {
        if let Some(path) = &template.custom_path {
            tracing::info!("Using {} for {}", path.display(), template.file_name);
        }
    }
    Ok(set)
}

async fn generate(args: &ScaffoldArgs, config: &Config) -> anyhow::Result<()> {
    let set = load_templates(&args.params, config).await?;
    let params = scaffold::build_params(&args.params.set, &args.params.keywords);
    let files = scaffold::render_all(&set, &params, args.strict)?;

    for file in &files {
        if !file.unresolved.is_empty() {
            tracing::warn!(
                "{} left unresolved: {}",
                file.path.display(),
                file.unresolved.join(", ")
            );
        }
    }

    if args.dry_run {
        for file in &files {
            if args.zip {
                println!("{}: {}", args.output.display(), file.path.display());
            } else {
                println!("{}", args.output.join(&file.path).display());
            }
        }
        return Ok(());
    }

    if args.zip {
        scaffold::write_zip(&files, &args.output, args.force)?;
        return Ok(());
    }

    let written = scaffold::write_files(&files, &args.output, args.force).await?;
    tracing::info!(
        "Generated {} files in {}",
        written.len(),
        args.output.display()
    );
    Ok(())
}

async fn check_templates(params: &ScaffoldParams, config: &Config) -> anyhow::Result<()> {
    let set = load_templates(params, config).await?;
    let report = scaffold::check(&set, &scaffold::build_params(&params.set, &params.keywords));

    for (template, names) in &report.unresolved {
        println!("{}: unresolved {}", template, names.join(", "));
    }
    for name in &report.unused {
        println!("unused parameter: {}", name);
    }
    for name in &report.invalid_names {
        println!("invalid parameter name: {}", name);
    }

    if !report.is_clean() {
        bail!("template check failed");
    }
    println!("ok");
    Ok(())
}

async fn manage_user(command: &UserCommand, cli: &Cli, config: Config) -> anyhow::Result<()> {
    let pool = open_database(cli, &config)?;
    let hours = config.auth.session_hours;
    let state = AppState::new(pool.clone(), config);

    let user_id = match command {
        UserCommand::Add {
            username,
            email,
            admin,
        } => {
            let now = Utc::now();
            let user = User {
                id: uuid::Uuid::now_v7().to_string(),
                username: username.clone(),
                email: email.clone(),
                bio: String::new(),
                is_admin: *admin,
                date_joined: now,
                updated_at: now,
            };
            let user = state
                .content
                .save_user(user, now)
                .await
                .with_context(|| format!("could not create user {}", username))?;
            user.id
        }
        UserCommand::Token { username } => {
            state
                .repo
                .find_user_by_username(username)
                .await?
                .ok_or_else(|| anyhow!("no user named {}", username))?
                .id
        }
    };

    let token = auth::create_session(&pool, &user_id, hours)?;
    println!("{}", token);
    Ok(())
}
