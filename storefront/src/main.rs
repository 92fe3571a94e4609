//! `casaroja` - the storefront from a terminal.

use anyhow::{Context, Result};
use casaroja_core::reducer::Reducer;
use casaroja_session::{Route, SessionState};
use casaroja_storefront::app::LiveEnvironment;
use casaroja_storefront::forms::Field;
use casaroja_storefront::pages::{
    DashboardAction, DashboardReducer, DashboardState, EventsAction, EventsReducer, EventsState,
    HomeAction, HomeReducer, HomeState, LoginAction, LoginReducer, LoginState, PurchaseAction,
    PurchaseReducer, PurchaseState, RegisterAction, RegisterReducer, RegisterState, TicketsAction,
    TicketsReducer, TicketsState, VenuesAction, VenuesReducer, VenuesState,
};
use casaroja_storefront::{render, Storefront, StorefrontConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Casa Roja - cultural events in Valparaíso
#[derive(Parser)]
#[command(name = "casaroja")]
#[command(about = "Browse events, manage your account and buy tickets", long_about = None)]
struct Cli {
    /// Backend base URL (overrides `CASAROJA_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the session is kept (overrides `CASAROJA_STATE_DIR`)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Landing page with featured events
    Home,
    /// Browse the event catalog
    Events {
        /// 1-based page
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
    },
    /// List venues
    Venues,
    /// Sign in
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Password
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        /// First name
        #[arg(long)]
        first_name: String,
        /// Last name
        #[arg(long)]
        last_name: String,
        /// Account email
        #[arg(long)]
        email: String,
        /// Password
        #[arg(long)]
        password: String,
        /// Password again
        #[arg(long)]
        confirm_password: String,
        /// Contact phone
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Sign out and forget cached data
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Your account and recommended events
    Dashboard,
    /// Your tickets
    Tickets,
    /// Redeem a ticket
    UseTicket {
        /// Ticket id
        id: u64,
    },
    /// Buy tickets for an event
    Buy {
        /// Event id
        event: u64,
        /// Number of attendees
        #[arg(long, default_value_t = 1)]
        participants: u32,
        /// Attendee name (repeatable)
        #[arg(long = "name")]
        names: Vec<String>,
        /// Notes for the organizer
        #[arg(long, default_value = "")]
        requests: String,
        /// Discount code
        #[arg(long, default_value = "")]
        discount_code: String,
    },
}

/// How long the session store may take to settle before the process exits.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "casaroja=info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn report_redirect(redirect: Option<Route>) {
    if let Some(route) = redirect {
        match route {
            Route::Login => eprintln!("Please sign in first: casaroja login --email <EMAIL>"),
            other => eprintln!("-> {}", other.path()),
        }
    }
}

async fn run<R, I>(storefront: &Storefront, initial: R::State, reducer: R, actions: I) -> Result<R::State>
where
    R: Reducer<Environment = LiveEnvironment> + Clone + Send + Sync + 'static,
    R::State: Clone + Send + Sync + 'static,
    R::Action: Send + Clone + 'static,
    I: IntoIterator<Item = R::Action>,
{
    storefront
        .run_page(initial, reducer, actions)
        .await
        .context("page store stopped unexpectedly")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = StorefrontConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    if let Some(dir) = cli.state_dir {
        config = config.with_state_dir(dir);
    }

    let storefront = Storefront::open(&config)?;
    let session = storefront.initialize().await?;

    let outcome = dispatch(cli.command, &storefront, session).await;
    storefront.shutdown(SHUTDOWN_GRACE).await?;
    outcome
}

async fn dispatch(command: Commands, storefront: &Storefront, session: SessionState) -> Result<()> {
    let authenticated = session.is_authenticated;

    match command {
        Commands::Home => {
            let state = run(storefront, HomeState::default(), HomeReducer::new(), [HomeAction::Load]).await?;
            print!("{}", render::home(&state));
        },

        Commands::Events { page, search } => {
            let mut actions = vec![EventsAction::GoToPage { page }];
            if let Some(query) = search {
                actions = vec![EventsAction::Search { query }];
                if page > 1 {
                    actions.push(EventsAction::GoToPage { page });
                }
            }
            let state = run(storefront, EventsState::default(), EventsReducer::new(), actions).await?;
            print!("{}", render::events(&state));
        },

        Commands::Venues => {
            let state = run(storefront, VenuesState::default(), VenuesReducer::new(), [VenuesAction::Load]).await?;
            print!("{}", render::venues(&state));
        },

        Commands::Login { email, password } => {
            let state = run(
                storefront,
                LoginState::default(),
                LoginReducer::new(),
                [
                    LoginAction::Edit { field: Field::Email, value: email },
                    LoginAction::Edit { field: Field::Password, value: password },
                    LoginAction::Submit,
                ],
            )
            .await?;

            if state.errors.is_empty() {
                let user = storefront.session().state(|s| s.user.clone()).await;
                match user {
                    Some(user) => println!("Welcome back, {}!", user.display_name()),
                    None => println!("Signed in."),
                }
            } else {
                anyhow::bail!("{}", render::form_errors(&state.errors).trim_end());
            }
        },

        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
            phone,
        } => {
            let state = run(
                storefront,
                RegisterState::default(),
                RegisterReducer::new(),
                [
                    RegisterAction::Edit { field: Field::FirstName, value: first_name },
                    RegisterAction::Edit { field: Field::LastName, value: last_name },
                    RegisterAction::Edit { field: Field::Email, value: email },
                    RegisterAction::Edit { field: Field::Password, value: password },
                    RegisterAction::Edit { field: Field::ConfirmPassword, value: confirm_password },
                    RegisterAction::Edit { field: Field::Phone, value: phone },
                    RegisterAction::Submit,
                ],
            )
            .await?;

            match state.welcome {
                Some(name) => println!("Welcome to Casa Roja, {name}!"),
                None => anyhow::bail!("{}", render::form_errors(&state.errors).trim_end()),
            }
            report_redirect(state.redirect.filter(|route| *route == Route::Login));
        },

        Commands::Logout => {
            storefront.logout().await?;
            println!("Signed out.");
        },

        Commands::Whoami => match session.user {
            Some(user) if authenticated => println!("{} <{}>", user.display_name(), user.email),
            _ => println!("Not signed in."),
        },

        Commands::Dashboard => {
            let state = run(
                storefront,
                DashboardState::default(),
                DashboardReducer::new(),
                [DashboardAction::Mount { authenticated }],
            )
            .await?;
            print!("{}", render::dashboard(&state));
            report_redirect(state.redirect);
        },

        Commands::Tickets => {
            let state = run(
                storefront,
                TicketsState::default(),
                TicketsReducer::new(),
                [TicketsAction::Mount { authenticated }],
            )
            .await?;
            print!("{}", render::tickets(&state));
            report_redirect(state.redirect);
        },

        Commands::UseTicket { id } => {
            let state = run(
                storefront,
                TicketsState::default(),
                TicketsReducer::new(),
                std::iter::once(TicketsAction::Mount { authenticated })
                    .chain(authenticated.then_some(TicketsAction::UseTicket { id })),
            )
            .await?;
            print!("{}", render::tickets(&state));
            report_redirect(state.redirect);
        },

        Commands::Buy {
            event,
            participants,
            names,
            requests,
            discount_code,
        } => {
            let state = run(
                storefront,
                PurchaseState::new(event),
                PurchaseReducer::new(),
                [
                    PurchaseAction::SetParticipants { count: participants },
                    PurchaseAction::SetParticipantNames { names },
                    PurchaseAction::SetSpecialRequests { text: requests },
                    PurchaseAction::SetDiscountCode { code: discount_code },
                    PurchaseAction::Submit { authenticated },
                ],
            )
            .await?;
            print!("{}", render::purchase(&state));
            report_redirect(state.redirect);
        },
    }

    Ok(())
}
