use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use deck_admin::{AdminApi, RpcProvider};
use deck_chain::{ChainId, EvmReceipt, TxOutcome};
use deck_core::fixed::proportion_to_percent;
use deck_core::logging::init_logging;
use deck_core::{ConfigManager, DeckError, user_message};
use tracing::{error, info};

use deck_app::hooks::{LockDraft, LockHookEditor, PenaltyDraft, PenaltyHookEditor, TransferHookEditor};
use deck_app::inspect::{ContractInspector, lookup_root};
use deck_app::reconcile::reconcile_deployment;
use deck_app::wizard::{Wizard, deploy_distributor, read_batch};
use deck_app::{AppContext, ConfigurationDeployer};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Operator console for token-distribution apps
#[derive(Parser)]
#[command(name = "dropdeck", version, about = "Manage airdrop apps, deployments and hooks")]
struct Cli {
    /// Log filter, e.g. `debug` (RUST_LOG wins when set)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backend environments
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },

    #[command(flatten)]
    Backend(BackendCommands),
}

/// Commands that talk to the selected environment's backend.
#[derive(Subcommand)]
enum BackendCommands {
    /// Apps known to the backend
    Apps {
        #[command(subcommand)]
        command: AppsCommands,
    },

    /// Compare every configuration of a deployment with chain state
    Status { app: String, deployment: String },

    /// Push a configuration's strategy on chain
    Apply {
        app: String,
        deployment: String,
        configuration: String,
    },

    /// Show live distributor state
    Inspect {
        app: String,
        deployment: String,
        /// Also show fee settings for this configuration
        #[arg(long)]
        configuration: Option<String>,
        /// Also show which configuration this root is bound to
        #[arg(long)]
        root: Option<String>,
    },

    /// Distributor administration
    Distributor {
        #[command(subcommand)]
        command: DistributorCommands,
    },

    /// Lock hook presets
    Lock {
        #[command(subcommand)]
        command: LockCommands,
    },

    /// Linear penalty hook windows
    Penalty {
        #[command(subcommand)]
        command: PenaltyCommands,
    },

    /// Transfer hook
    Transfer {
        #[command(subcommand)]
        command: TransferCommands,
    },

    /// Upload a recipient CSV as a named batch
    Upload {
        app: String,
        batch: String,
        file: PathBuf,
        #[arg(long)]
        primary_key: String,
        #[arg(long, default_value = "")]
        template: String,
    },

    /// List a batch's allocations
    Allocations { app: String, batch: String },

    /// App creation wizard
    Wizard {
        #[command(subcommand)]
        command: WizardCommands,
    },

    /// Backend RPC providers
    Rpc {
        #[command(subcommand)]
        command: RpcCommands,
    },
}

#[derive(Subcommand)]
enum EnvCommands {
    /// Add or update an environment
    Set {
        name: String,
        base_url: String,
        api_key: String,
    },
    /// Select the environment used by every other command
    Use { name: String },
    /// List configured environments
    List,
    /// Delete an environment and its key
    Remove { name: String },
}

#[derive(Subcommand)]
enum AppsCommands {
    List,
}

#[derive(Subcommand)]
enum DistributorCommands {
    /// Deploy the distributor and record it as the `contract` role
    Deploy { app: String, deployment: String },
    Pause { app: String, deployment: String },
    Unpause { app: String, deployment: String },
    /// Bind an uploaded root to a configuration
    SetClaimRoot {
        app: String,
        deployment: String,
        root: String,
        configuration: String,
    },
    SetFee {
        app: String,
        deployment: String,
        configuration: String,
        #[arg(long)]
        mode: u8,
        #[arg(long, default_value = "0")]
        fixed_fee: String,
        #[arg(long, default_value = "0")]
        rate: String,
    },
}

#[derive(Subcommand)]
enum LockCommands {
    Show {
        app: String,
        deployment: String,
        configuration: String,
    },
    Set {
        app: String,
        deployment: String,
        configuration: String,
        /// Unix seconds or RFC 3339
        #[arg(long)]
        start_time: String,
        #[arg(long)]
        cliff_duration: String,
        #[arg(long)]
        vesting_duration: String,
        #[arg(long)]
        piece_duration: String,
        /// Percent, e.g. 12.5
        #[arg(long)]
        start_unlock: String,
        #[arg(long)]
        cliff_unlock: String,
        #[arg(long)]
        lock: String,
        #[arg(long)]
        fixed_start: bool,
    },
    Deploy { app: String, deployment: String },
}

#[derive(Subcommand)]
enum PenaltyCommands {
    Show {
        app: String,
        deployment: String,
        configuration: String,
        /// Preview the penalty taken from this amount
        #[arg(long)]
        amount: Option<String>,
    },
    Set {
        app: String,
        deployment: String,
        configuration: String,
        #[arg(long)]
        begin_time: String,
        #[arg(long)]
        end_time: String,
    },
    Deploy { app: String, deployment: String },
}

#[derive(Subcommand)]
enum TransferCommands {
    Deploy { app: String, deployment: String },
}

#[derive(Subcommand)]
enum WizardCommands {
    /// Create a new app and mark it in progress
    Start {
        app_id: String,
        #[arg(long)]
        gated: bool,
        #[arg(long)]
        unique_device: bool,
    },
    /// Show the app left in progress
    Resume,
    /// Create a relayer for a chain
    Relayer { chain_id: String },
    /// List the app's relayers
    Relayers,
    /// Register a deployment target
    AddDeployment {
        name: String,
        chain_id: String,
        rpc_url: String,
    },
    /// Assign an address to a deployment role
    AssignRole {
        deployment: String,
        role: String,
        address: String,
    },
    /// Upload a recipient CSV and merge the returned roots
    Upload {
        batch: String,
        file: PathBuf,
        #[arg(long)]
        primary_key: String,
        #[arg(long, default_value = "")]
        template: String,
    },
    /// Deploy the distributor for a deployment
    Deploy { deployment: String },
    /// Save the in-progress app
    Save,
    /// Save the in-progress app and clear the marker
    Finish,
}

#[derive(Subcommand)]
enum RpcCommands {
    List,
    Set { chain_id: String, rpc_url: String },
    Remove { chain_id: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_guard = match init_logging(cli.log_level.as_deref()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e:#}");
            None
        }
    };
    info!("dropdeck v{VERSION}");

    if let Err(e) = run(cli.command).await {
        error!("{e:#}");
        eprintln!("Error: {}", user_message(&e));
        drop(log_guard);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    let config = ConfigManager::new()?;
    match command {
        Commands::Env { command } => env_command(&config, command),
        Commands::Backend(command) => backend_command(&AppContext::from_home(config)?, command).await,
    }
}

async fn backend_command(ctx: &AppContext, command: BackendCommands) -> Result<()> {
    match command {
        BackendCommands::Apps { command: AppsCommands::List } => {
            for app in ctx.admin().list_app_confs().await? {
                println!("{}\t{} deployment(s)", app.app_id, app.deployments.len());
            }
            Ok(())
        }
        BackendCommands::Status { app, deployment } => status(ctx, &app, &deployment).await,
        BackendCommands::Apply {
            app,
            deployment,
            configuration,
        } => {
            let mut store = ctx.store(&app);
            store.fetch().await?;
            let client = ctx.client_for(store.current()?.deployment(&deployment)?)?;
            let report = ConfigurationDeployer::new(ctx.tx(&*client), &*client)
                .apply(&mut store, &deployment, &configuration)
                .await?;
            for warning in &report.warnings {
                println!("warning: {warning}");
            }
            match report.outcome.receipt.as_ref().and_then(EvmReceipt::gas) {
                Some(gas) => println!("applied in {} (gas {gas})", report.outcome.tx_hash),
                None => println!("applied in {}", report.outcome.tx_hash),
            }
            for (name, status) in &report.statuses {
                println!("{name}\t{}", status.sync_state());
            }
            Ok(())
        }
        BackendCommands::Inspect {
            app,
            deployment,
            configuration,
            root,
        } => {
            let mut store = ctx.store(&app);
            let conf = store.fetch().await?;
            let dep = conf.deployment(&deployment)?;
            let client = ctx.client_for(dep)?;
            let inspector = ContractInspector::new(ctx.tx(&*client), &*client);

            let snapshot = inspector.snapshot(dep).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            if let Some(configuration) = configuration {
                let fees = inspector.fees(dep, &configuration).await?;
                println!(
                    "fees[{configuration}]: mode={} fixed={} rate={}",
                    fees.mode, fees.fixed_fee, fees.single_tier_rate
                );
            }
            if let Some(root) = root {
                let hash = lookup_root(conf, dep, &root).unwrap_or_default();
                let id = inspector.root_binding(conf, dep, &root).await?;
                println!("root[{root}] {hash} -> configuration {id}");
            }
            Ok(())
        }
        BackendCommands::Distributor { command } => distributor_command(ctx, command).await,
        BackendCommands::Lock { command } => lock_command(ctx, command).await,
        BackendCommands::Penalty { command } => penalty_command(ctx, command).await,
        BackendCommands::Transfer {
            command: TransferCommands::Deploy { app, deployment },
        } => {
            let mut store = ctx.store(&app);
            store.fetch().await?;
            let client = ctx.client_for(store.current()?.deployment(&deployment)?)?;
            let outcome = TransferHookEditor::new(ctx.tx(&*client))
                .deploy(&mut store, &deployment)
                .await?;
            print_deploy("transfer hook", &outcome);
            Ok(())
        }
        BackendCommands::Upload {
            app,
            batch,
            file,
            primary_key,
            template,
        } => {
            let upload = read_batch(&file, &template, &primary_key)?;
            let mut store = ctx.store(&app);
            store.fetch().await?;
            let response = ctx.admin().upload_batch(&app, &batch, &upload).await?;
            store
                .commit(|conf| {
                    conf.merge_roots(&response.root);
                    Ok(())
                })
                .await?;
            for (name, root) in &response.root {
                println!("{name}\t{root}");
            }
            Ok(())
        }
        BackendCommands::Allocations { app, batch } => {
            for a in ctx.admin().list_allocations(&app, &batch).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    a.address_handler,
                    a.allocation,
                    a.claim_at.as_deref().unwrap_or("-"),
                    a.recipient().unwrap_or("-"),
                );
            }
            Ok(())
        }
        BackendCommands::Wizard { command } => wizard_command(ctx, command).await,
        BackendCommands::Rpc { command } => {
            let api = ctx.admin();
            match command {
                RpcCommands::List => {
                    for p in api.list_rpc_providers().await? {
                        println!("{}\t{}", p.chain_id, p.rpc_url);
                    }
                }
                RpcCommands::Set { chain_id, rpc_url } => {
                    api.set_rpc_provider(&RpcProvider { chain_id, rpc_url }).await?;
                }
                RpcCommands::Remove { chain_id } => api.delete_rpc_provider(&chain_id).await?,
            }
            Ok(())
        }
    }
}

async fn wizard_command(ctx: &AppContext, command: WizardCommands) -> Result<()> {
    match command {
        WizardCommands::Start {
            app_id,
            gated,
            unique_device,
        } => {
            let mut wizard = Wizard::new(Arc::clone(ctx.admin()), ctx.session_path());
            wizard.set_basic(&app_id, gated, unique_device)?;
            if !wizard.next().await {
                anyhow::bail!("{}", wizard.error().unwrap_or("could not save the app"));
            }
            println!("{} created, next step: {}", app_id.trim(), wizard.current_step().title());
        }
        WizardCommands::Resume => {
            let Some(wizard) = Wizard::resume(Arc::clone(ctx.admin()), ctx.session_path()).await? else {
                println!("no app in progress");
                return Ok(());
            };
            let app = wizard.app()?;
            println!(
                "{} at step {} ({})",
                app.app_id,
                wizard.current_step().index() + 1,
                wizard.current_step().title()
            );
            for (name, dep) in &app.deployments {
                println!("  {name}\tchain {}", dep.chain_id);
            }
        }
        WizardCommands::Relayer { chain_id } => {
            let relayer = resume_wizard(ctx).await?.create_relayer(&chain_id).await?;
            println!("relayer {} on {}", relayer.address, relayer.chain_id);
        }
        WizardCommands::Relayers => {
            for r in resume_wizard(ctx).await?.relayers().await? {
                let state = if r.online { "online" } else { "offline" };
                println!("{}\t{}\tnonce {}\t{state}", r.chain_id, r.address, r.nonce);
            }
        }
        WizardCommands::AddDeployment {
            name,
            chain_id,
            rpc_url,
        } => {
            let mut wizard = resume_wizard(ctx).await?;
            wizard.add_deployment(&name, &chain_id, &rpc_url)?;
            wizard.save().await?;
        }
        WizardCommands::AssignRole {
            deployment,
            role,
            address,
        } => {
            let mut wizard = resume_wizard(ctx).await?;
            wizard.assign_role(&deployment, &role, &address)?;
            wizard.save().await?;
        }
        WizardCommands::Upload {
            batch,
            file,
            primary_key,
            template,
        } => {
            let mut wizard = resume_wizard(ctx).await?;
            wizard.select_csv(file);
            let response = wizard.upload_batch(&batch, &template, &primary_key).await?;
            wizard.save().await?;
            for (name, root) in &response.root {
                println!("{name}\t{root}");
            }
        }
        WizardCommands::Deploy { deployment } => {
            let mut wizard = resume_wizard(ctx).await?;
            let client = ctx.client_for(wizard.app()?.deployment(&deployment)?)?;
            let outcome = wizard.deploy_distributor(&ctx.tx(&*client), &deployment).await?;
            print_deploy("distributor", &outcome);
        }
        WizardCommands::Save => resume_wizard(ctx).await?.save().await?,
        WizardCommands::Finish => {
            resume_wizard(ctx).await?.finish().await?;
            println!("done");
        }
    }
    Ok(())
}

async fn resume_wizard(ctx: &AppContext) -> Result<Wizard> {
    Wizard::resume(Arc::clone(ctx.admin()), ctx.session_path())
        .await?
        .ok_or_else(|| DeckError::NotFound("App in progress".into()).into())
}

fn print_deploy(what: &str, outcome: &TxOutcome) {
    match outcome.contract_address() {
        Some(address) => println!("{what} {address} deployed in {}", outcome.tx_hash),
        None => println!(
            "{what} deployed in {}; no receipt, assign its role once the address is known",
            outcome.tx_hash
        ),
    }
}

fn env_command(config: &ConfigManager, command: EnvCommands) -> Result<()> {
    match command {
        EnvCommands::Set {
            name,
            base_url,
            api_key,
        } => config.set_config(&name, &base_url, &api_key),
        EnvCommands::Use { name } => config.set_selected_env(&name),
        EnvCommands::List => {
            let current = config.get();
            for (name, env) in &current.environments {
                let marker = if current.selected_env.as_deref() == Some(name.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {name}\t{}", env.base_url);
            }
            Ok(())
        }
        EnvCommands::Remove { name } => {
            if !config.remove_environment(&name)? {
                return Err(DeckError::NotFound(format!("Environment '{name}'")).into());
            }
            Ok(())
        }
    }
}

async fn status(ctx: &AppContext, app: &str, deployment: &str) -> Result<()> {
    let mut store = ctx.store(app);
    let dep = store.fetch().await?.deployment(deployment)?;
    let chain: ChainId = dep.chain_id.parse()?;
    println!("{deployment} on {} ({})", chain.label(), dep.rpc_url);
    for (role, address) in dep.hook_roles() {
        println!("  {role:<20} {address}");
    }

    let client = ctx.client_for(dep)?;
    let statuses = reconcile_deployment(&*client, dep).await;
    println!("{:<24} {:<9} {:<8} state", "configuration", "deployed", "matched");
    for (name, status) in &statuses {
        println!(
            "{name:<24} {:<9} {:<8} {}",
            status.is_deployed,
            status.is_matched,
            status.sync_state()
        );
        for strategy in dep.resolved_strategy(name).unwrap_or_default() {
            let share = proportion_to_percent(&strategy.proportion)
                .unwrap_or_else(|_| strategy.proportion.clone());
            println!("    {share:>8}%  {}", strategy.hook);
        }
    }
    Ok(())
}

async fn distributor_command(ctx: &AppContext, command: DistributorCommands) -> Result<()> {
    match command {
        DistributorCommands::Deploy { app, deployment } => {
            let mut store = ctx.store(&app);
            let client = ctx.client_for(store.fetch().await?.deployment(&deployment)?)?;
            let outcome = deploy_distributor(&ctx.tx(&*client), &mut store, &deployment).await?;
            print_deploy("distributor", &outcome);
        }
        DistributorCommands::Pause { app, deployment } => toggle(ctx, &app, &deployment, true).await?,
        DistributorCommands::Unpause { app, deployment } => toggle(ctx, &app, &deployment, false).await?,
        DistributorCommands::SetClaimRoot {
            app,
            deployment,
            root,
            configuration,
        } => {
            let mut store = ctx.store(&app);
            let client = ctx.client_for(store.fetch().await?.deployment(&deployment)?)?;
            let outcome = ContractInspector::new(ctx.tx(&*client), &*client)
                .set_claim_root(&mut store, &deployment, &root, &configuration)
                .await?;
            println!("root {root} bound to {configuration} in {}", outcome.tx_hash);
        }
        DistributorCommands::SetFee {
            app,
            deployment,
            configuration,
            mode,
            fixed_fee,
            rate,
        } => {
            let mut store = ctx.store(&app);
            let client = ctx.client_for(store.fetch().await?.deployment(&deployment)?)?;
            let outcome = ContractInspector::new(ctx.tx(&*client), &*client)
                .set_fee(&app, &deployment, &configuration, mode, &fixed_fee, &rate)
                .await?;
            println!("fee updated in {}", outcome.tx_hash);
        }
    }
    Ok(())
}

async fn toggle(ctx: &AppContext, app: &str, deployment: &str, pause: bool) -> Result<()> {
    let mut store = ctx.store(app);
    let client = ctx.client_for(store.fetch().await?.deployment(deployment)?)?;
    let inspector = ContractInspector::new(ctx.tx(&*client), &*client);
    let outcome = if pause {
        inspector.pause(app, deployment).await?
    } else {
        inspector.unpause(app, deployment).await?
    };
    println!("{} in {}", if pause { "paused" } else { "unpaused" }, outcome.tx_hash);
    Ok(())
}

async fn lock_command(ctx: &AppContext, command: LockCommands) -> Result<()> {
    match command {
        LockCommands::Show {
            app,
            deployment,
            configuration,
        } => {
            let mut store = ctx.store(&app);
            let dep = store.fetch().await?.deployment(&deployment)?;
            let client = ctx.client_for(dep)?;
            let preset = LockHookEditor::new(ctx.tx(&*client), &*client)
                .read(dep, &configuration)
                .await?;
            print_lock(&LockDraft::from_preset(&preset));
        }
        LockCommands::Set {
            app,
            deployment,
            configuration,
            start_time,
            cliff_duration,
            vesting_duration,
            piece_duration,
            start_unlock,
            cliff_unlock,
            lock,
            fixed_start,
        } => {
            let draft = LockDraft {
                start_time,
                cliff_duration,
                vesting_duration,
                piece_duration,
                start_unlock_percentage: start_unlock,
                cliff_unlock_percentage: cliff_unlock,
                lock,
                is_fixed_start: fixed_start,
            };
            draft.validate()?;
            let mut store = ctx.store(&app);
            let dep = store.fetch().await?.deployment(&deployment)?.clone();
            let client = ctx.client_for(&dep)?;
            let preset = LockHookEditor::new(ctx.tx(&*client), &*client)
                .submit(&app, &deployment, &dep, &configuration, &draft)
                .await?;
            print_lock(&LockDraft::from_preset(&preset));
        }
        LockCommands::Deploy { app, deployment } => {
            let mut store = ctx.store(&app);
            let client = ctx.client_for(store.fetch().await?.deployment(&deployment)?)?;
            let outcome = LockHookEditor::new(ctx.tx(&*client), &*client)
                .deploy(&mut store, &deployment)
                .await?;
            print_deploy("lock hook", &outcome);
        }
    }
    Ok(())
}

fn print_lock(draft: &LockDraft) {
    println!("start time        {}", draft.start_time);
    println!("cliff duration    {}s", draft.cliff_duration);
    println!("vesting duration  {}s", draft.vesting_duration);
    println!("piece duration    {}s", draft.piece_duration);
    println!("start unlock      {}%", draft.start_unlock_percentage);
    println!("cliff unlock      {}%", draft.cliff_unlock_percentage);
    println!("lock              {}", draft.lock);
    println!("fixed start       {}", draft.is_fixed_start);
}

async fn penalty_command(ctx: &AppContext, command: PenaltyCommands) -> Result<()> {
    match command {
        PenaltyCommands::Show {
            app,
            deployment,
            configuration,
            amount,
        } => {
            let mut store = ctx.store(&app);
            let dep = store.fetch().await?.deployment(&deployment)?;
            let client = ctx.client_for(dep)?;
            let editor = PenaltyHookEditor::new(ctx.tx(&*client), &*client);
            let window = editor.read(dep, &configuration).await?;
            println!("begin {}  end {}", window.begin_time, window.end_time);
            if let Some(amount) = amount {
                let penalty = editor.preview(dep, &configuration, &amount).await?;
                println!("penalty on {amount}: {penalty}");
            }
        }
        PenaltyCommands::Set {
            app,
            deployment,
            configuration,
            begin_time,
            end_time,
        } => {
            let draft = PenaltyDraft {
                begin_time,
                end_time,
            };
            draft.validate()?;
            let mut store = ctx.store(&app);
            let dep = store.fetch().await?.deployment(&deployment)?.clone();
            let client = ctx.client_for(&dep)?;
            let window = PenaltyHookEditor::new(ctx.tx(&*client), &*client)
                .submit(&app, &deployment, &dep, &configuration, &draft)
                .await?;
            println!("begin {}  end {}", window.begin_time, window.end_time);
        }
        PenaltyCommands::Deploy { app, deployment } => {
            let mut store = ctx.store(&app);
            let client = ctx.client_for(store.fetch().await?.deployment(&deployment)?)?;
            let outcome = PenaltyHookEditor::new(ctx.tx(&*client), &*client)
                .deploy(&mut store, &deployment)
                .await?;
            print_deploy("penalty hook", &outcome);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn env_stays_outside_backend_commands() {
        let cli = Cli::try_parse_from(["dropdeck", "env", "use", "prod"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Env {
                command: EnvCommands::Use { .. }
            }
        ));

        let cli = Cli::try_parse_from(["dropdeck", "status", "drop", "base"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Backend(BackendCommands::Status { .. })
        ));
    }

    #[test]
    fn wizard_steps_have_subcommands() {
        let parse = |args: &[&str]| {
            let cli = Cli::try_parse_from(["dropdeck", "wizard"].iter().chain(args).copied()).unwrap();
            match cli.command {
                Commands::Backend(BackendCommands::Wizard { command }) => command,
                _ => panic!("not a wizard command"),
            }
        };

        assert!(matches!(
            parse(&["start", "drop", "--gated"]),
            WizardCommands::Start { gated: true, unique_device: false, .. }
        ));
        assert!(matches!(parse(&["relayer", "8453"]), WizardCommands::Relayer { .. }));
        assert!(matches!(
            parse(&["add-deployment", "base", "8453", "https://mainnet.base.org"]),
            WizardCommands::AddDeployment { .. }
        ));
        match parse(&["upload", "batch-1", "recipients.csv", "--primary-key", "address"]) {
            WizardCommands::Upload {
                batch,
                primary_key,
                template,
                ..
            } => {
                assert_eq!(batch, "batch-1");
                assert_eq!(primary_key, "address");
                assert!(template.is_empty());
            }
            _ => panic!("not an upload"),
        }
        assert!(matches!(parse(&["deploy", "base"]), WizardCommands::Deploy { .. }));
        assert!(matches!(parse(&["save"]), WizardCommands::Save));
    }
}
