/*
 * Responsibility
 * - tracing / panic hook setup
 * - ClientConfig -> AppState construction
 * - The terminal journey: customer type -> login -> consent -> profile -> API -> step-up
 */
use std::{panic, process, time::Duration};

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::config::ClientConfig;
use crate::error::{AppError, StepUpError};
use crate::services::api_client::ApiClient;
use crate::services::auth::{AccessToken, LoopbackReceiver};
use crate::services::consent::ConsentSelections;
use crate::services::customer_data::insurance::{group_by_category, total_annual_premium};
use crate::services::session::LoginStart;
use crate::services::step_up::{ActionDecision, SENSITIVE_ACTIONS};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,ciam_demo=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing();
    let config = ClientConfig::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    match cli.command {
        Command::Actions => {
            print_actions();
            Ok(())
        }
        Command::Public => {
            let api = ApiClient::new(config.api_base_url.clone(), http_client(&config)?);
            let body = api.call_public().await?;
            println!("{} ({})", body.message, body.status);
            Ok(())
        }
        Command::Protected { token } => {
            let api = ApiClient::new(config.api_base_url.clone(), http_client(&config)?);
            let token = token.map(|t| AccessToken::new(t, None));
            let body = api.call_protected(token.as_ref()).await?;
            println!("{} ({})", body.message, body.status);
            println!("  subject: {}", body.token_info.subject);
            Ok(())
        }
        Command::Login {
            customer_type,
            timeout,
        } => {
            let mut state = AppState::from_config(&config).await?;
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            journey(
                &mut state,
                &config,
                customer_type,
                Duration::from_secs(timeout),
                &mut input,
            )
            .await
        }
    }
}

fn http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("failed to build http client")
}

fn print_actions() {
    for action in &SENSITIVE_ACTIONS {
        let marker = if action.requires_step_up { "step-up" } else { "-" };
        println!("{:<18} {:<8} {}", action.id, marker, action.name);
    }
}

async fn prompt(input: &mut Lines<BufReader<Stdin>>, question: &str) -> Result<String> {
    println!("{question}");
    let line = input.next_line().await?.unwrap_or_default();
    Ok(line.trim().to_string())
}

fn yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "j" | "ja" | "y" | "yes")
}

async fn journey(
    state: &mut AppState,
    config: &ClientConfig,
    customer_type: Option<String>,
    timeout: Duration,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    let raw = match customer_type {
        Some(raw) => raw,
        None => prompt(input, "Kundetype (private/business):").await?,
    };
    if let Err(e) = state.profiles.select_customer_type(&raw) {
        bail!("{e}");
    }

    let receiver = LoopbackReceiver::bind(&config.redirect_uri)
        .await
        .context("could not listen on REDIRECT_URI")?;

    match state.login()? {
        LoginStart::Redirect(url) | LoginStart::AlreadyInProgress(url) => {
            println!("Åpne denne lenken i nettleseren for å logge inn:\n\n  {url}\n");
        }
        LoginStart::AlreadyAuthenticated => {}
    }

    if let Err(e) = state.await_callback(receiver, timeout).await {
        tracing::warn!(error = %e, "login failed");
        return Err(e.into());
    }

    let Some(user) = state.user() else {
        bail!("login finished without a user");
    };
    println!("Logget inn som {}", user.email.as_deref().unwrap_or(&user.sub));

    if state.consent_required() {
        let analytics = yes(&prompt(input, "Tillat analyse? (j/n)").await?);
        let marketing = yes(&prompt(input, "Tillat markedsføring? (j/n)").await?);
        let third_party = yes(&prompt(input, "Tillat deling med tredjeparter? (j/n)").await?);
        let outcome = state
            .accept_consent(ConsentSelections {
                analytics,
                marketing,
                third_party,
            })
            .await?;
        if !outcome.persisted {
            println!("(samtykket kunne ikke lagres, gjelder kun denne økten)");
        }
    }

    if let Some(profile) = state.user_profile().await {
        println!(
            "{} - kundenummer {} - {}",
            profile.full_name,
            profile.customer_number,
            profile.address.single_line()
        );
    }

    state.initialize_profile().await?;
    show_identity(state).await;

    let identities = state.available_identities().await;
    if identities.len() > 1 {
        for identity in &identities {
            println!("  [{}] {} ({})", identity.id, identity.name, identity.subtitle);
        }
        let choice = prompt(input, "Bytt profil (id, tom for å beholde):").await?;
        if !choice.is_empty() {
            match state.switch_identity(&choice).await {
                Ok(_) => show_identity(state).await,
                Err(e) => println!("{e}"),
            }
        }
    }

    match state.call_protected().await {
        Ok(body) => println!("API: {} (sub {})", body.message, body.token_info.subject),
        Err(AppError::Api(e)) => println!("API-feil: {e}"),
        Err(e) => return Err(e.into()),
    }

    step_up_demo(state, input).await?;

    if yes(&prompt(input, "Logge ut? (j/n)").await?) {
        state.logout().await?;
        println!("Logget ut.");
    }
    Ok(())
}

async fn show_identity(state: &AppState) {
    let Some(active) = state.profiles.active() else {
        return;
    };
    println!("\nAktiv profil: {} ({})", active.name, active.subtitle);

    let insurances = state.visible_insurances().await;
    for (category, items) in group_by_category(&insurances) {
        println!("  {}", category.label());
        for insurance in items {
            println!(
                "    {:<24} {:<14} {:<10} {}",
                insurance.kind,
                insurance.policy_number,
                insurance.status.label(),
                insurance.premium_label()
            );
        }
    }
    println!("  Årlig premie: {} kr", total_annual_premium(&insurances));
}

async fn step_up_demo(state: &mut AppState, input: &mut Lines<BufReader<Stdin>>) -> Result<()> {
    print_actions();
    let action_id = prompt(input, "Utfør handling (id, tom for å hoppe over):").await?;
    if action_id.is_empty() {
        return Ok(());
    }

    let action = match state.step_up.request_action(&action_id)? {
        ActionDecision::Permitted(action) => {
            println!("{} utført.", action.name);
            return Ok(());
        }
        ActionDecision::ChallengeRequired(action) => action,
    };

    println!("{} krever ekstra bekreftelse.", action.name);
    loop {
        let code = prompt(
            input,
            &format!(
                "Engangskode ({} s igjen, 'r' for ny kode, tom for å avbryte):",
                state.step_up.seconds_left()
            ),
        )
        .await?;

        if code.is_empty() {
            state.step_up.cancel();
            println!("Avbrutt.");
            return Ok(());
        }
        if code == "r" {
            state.step_up.resend_code()?;
            continue;
        }

        match state.step_up.verify(&code) {
            Ok(action) => {
                println!("{} bekreftet og utført.", action.name);
                return Ok(());
            }
            Err(StepUpError::InvalidCode) => println!("Feil kode, prøv igjen."),
            Err(StepUpError::ChallengeExpired) => println!("Koden er utløpt. Skriv 'r' for ny kode."),
            Err(e) => return Err(e.into()),
        }
    }
}
