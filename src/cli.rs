use clap::{Parser, Subcommand};

/// Terminal client for the CIAM demo: login with PKCE, consent, profiles and step-up.
#[derive(Parser, Debug)]
#[command(name = "ciam-demo", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in through the browser and walk the customer journey
    Login {
        /// `private` or `business`
        #[arg(long, value_name = "TYPE")]
        customer_type: Option<String>,

        /// Seconds to wait for the provider redirect
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Call the resource server's public endpoint
    Public,

    /// Call the protected endpoint with a raw bearer token (or none)
    Protected {
        #[arg(long)]
        token: Option<String>,
    },

    /// List the sensitive actions and whether they need step-up
    Actions,
}
