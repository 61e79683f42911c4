use clap::Parser;
use watchtower::cli::{
    auth, backends, dashboard, export, handle_completions, handle_config_init,
    load_config_with_overrides, servers, AppContext, BackendsCommands, Cli, Commands,
    ConfigCommands, ServersCommands,
};

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = match cli.command {
        Commands::Config(ConfigCommands::Init(args)) => return handle_config_init(&args),
        Commands::Completions(args) => {
            handle_completions(&args);
            return Ok(());
        }
        command => command,
    };

    let config = load_config_with_overrides(&cli.global)?;
    watchtower::logging::init_tracing(&config.logging)?;
    let ctx = AppContext::from_config(config)?;
    let json = cli.global.json;

    let output = match command {
        Commands::Backends(cmd) => match cmd {
            BackendsCommands::List => backends::handle_backends_list(&ctx.registry, json),
            BackendsCommands::Add(args) => backends::handle_backends_add(&args, &ctx.registry),
            BackendsCommands::Remove(args) => {
                backends::handle_backends_remove(&args, &ctx.registry)
            }
            BackendsCommands::Use(args) => backends::handle_backends_use(&args, &ctx.registry),
        },
        Commands::Login(args) => auth::handle_login(&args, &ctx.session, json).await,
        Commands::Logout => Ok(auth::handle_logout(&ctx.session)),
        Commands::Whoami => auth::handle_whoami(&ctx.session, json).await,
        Commands::Servers(cmd) => match cmd {
            ServersCommands::List => servers::handle_servers_list(&ctx.remote, json).await,
            ServersCommands::Show(args) => {
                servers::handle_servers_show(&args, &ctx.remote, json).await
            }
            ServersCommands::Add(args) => {
                servers::handle_servers_add(args, &ctx.remote, json).await
            }
            ServersCommands::Update(args) => {
                servers::handle_servers_update(args, &ctx.remote, json).await
            }
            ServersCommands::Delete(args) => {
                servers::handle_servers_delete(&args, &ctx.remote).await
            }
            ServersCommands::Check(args) => {
                servers::handle_servers_check(&args, &ctx.remote, json).await
            }
            ServersCommands::Discover(args) => {
                servers::handle_servers_discover(&args, &ctx.remote).await
            }
            ServersCommands::Endpoints(args) => {
                servers::handle_servers_endpoints(&args, &ctx.remote, json).await
            }
            ServersCommands::Scan(args) => {
                servers::handle_servers_scan(&args, &ctx.remote, json).await
            }
        },
        Commands::Dashboard(args) => dashboard::handle_dashboard(&args, &ctx, json).await,
        Commands::Export(args) => export::handle_export(&args, &ctx.executor).await,
        Commands::Config(_) | Commands::Completions(_) => Ok(String::new()),
    }?;

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
