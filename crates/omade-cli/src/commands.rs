use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use omade_core::models::{validate_password, ProfileUpdate};
use omade_core::routes::guard;
use omade_core::seo::{self, SeoOverrides};
use omade_core::{ApiError, AppContext, Config, LoginCredentials, Navigation, SessionError};
use tracing::{debug, warn};

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password
    Login {
        /// Account email (defaults to the last one used)
        #[arg(short, long)]
        email: Option<String>,

        /// Where to go after logging in
        #[arg(long)]
        redirect: Option<String>,
    },
    /// End the session
    Logout,
    /// Show the current session
    Whoami,
    /// Enter the dashboard
    Dashboard,
    /// Navigate to a site path through the route guard
    Open { path: String },
    /// Check whether the session grants a permission
    Can { permission: String },
    /// Authenticated GET against the API, printing the JSON response
    Get { path: String },
    /// Show or update the profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Change the account password
    ChangePassword,
    /// Request a password reset email
    ForgotPassword { email: String },
    /// Set a new password with a reset token
    ResetPassword { token: String },
    /// Print sitemap.xml for the public pages
    Sitemap,
    /// Print robots.txt
    Robots,
    /// Print the document head for a page
    Head {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        canonical: Option<String>,
        #[arg(long)]
        no_index: bool,
    },
}

impl Commands {
    pub async fn execute(self, config: Config) -> Result<()> {
        let ctx = AppContext::from_config(config.clone())?;
        ctx.init()?;

        match self {
            Commands::Login { email, redirect } => {
                let email = match email.or_else(|| config.last_email.clone()) {
                    Some(email) => email,
                    None => prompt("Email: ")?,
                };
                let password = rpassword::prompt_password("Password: ")?;
                let credentials = LoginCredentials::new(email.clone(), password);

                match ctx.login(&credentials, redirect.as_deref()).await {
                    Ok((user, navigation)) => {
                        println!("Logged in as {}", user.display_name());
                        print_navigation(&navigation);
                    }
                    Err(e @ (SessionError::InvalidCredentials(_) | SessionError::Validation(_))) => {
                        bail!("{}", e)
                    }
                    Err(e) => return Err(e).context("Login failed"),
                }

                if let Err(e) = Config::remember_email(&email) {
                    warn!(error = %e, "Failed to remember login email");
                }
            }
            Commands::Logout => {
                let was_authenticated = ctx.session().is_authenticated();
                let navigation = ctx.logout().await;
                if was_authenticated {
                    println!("Logged out");
                } else {
                    println!("Not logged in");
                }
                print_navigation(&navigation);
            }
            Commands::Whoami => match ctx.session().user() {
                Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
                None => println!("Not logged in"),
            },
            Commands::Dashboard => {
                let navigation = ctx.router().navigate(guard::DEFAULT_LANDING);
                match (&navigation, ctx.session().user()) {
                    (Navigation::Entered(_), Some(user)) => {
                        println!("Dashboard");
                        println!("  Welcome back, {}", user.display_name());
                        if !user.role.is_empty() {
                            println!("  Role: {}", user.role);
                        }
                        if !user.permissions.is_empty() {
                            let permissions: Vec<&str> =
                                user.permissions.iter().map(String::as_str).collect();
                            println!("  Permissions: {}", permissions.join(", "));
                        }
                    }
                    _ => print_navigation(&navigation),
                }
            }
            Commands::Open { path } => {
                print_navigation(&ctx.router().navigate(&path));
            }
            Commands::Can { permission } => {
                let granted = ctx.router().has_permission(&permission);
                println!("{}", if granted { "yes" } else { "no" });
            }
            Commands::Get { path } => {
                let body = ctx
                    .api()
                    .get::<serde_json::Value>(&path)
                    .await
                    .map_err(|e| api_failure(&ctx, e))?;
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            Commands::Profile { name, email } => {
                let update = ProfileUpdate {
                    name,
                    email,
                    ..ProfileUpdate::default()
                };
                let user = if update.is_empty() {
                    ctx.api().get_profile().await
                } else {
                    ctx.api().update_profile(&update).await
                }
                .map_err(|e| api_failure(&ctx, e))?;
                println!("{}", serde_json::to_string_pretty(&user)?);
            }
            Commands::ChangePassword => {
                let current = rpassword::prompt_password("Current password: ")?;
                let new = prompt_new_password()?;
                ctx.api()
                    .change_password(&current, &new)
                    .await
                    .map_err(|e| api_failure(&ctx, e))?;
                println!("Password changed");
            }
            Commands::ForgotPassword { email } => {
                ctx.api()
                    .forgot_password(&email)
                    .await
                    .context("Failed to request password reset")?;
                println!("If {} has an account, a reset link is on its way", email);
            }
            Commands::ResetPassword { token } => {
                let password = prompt_new_password()?;
                ctx.api()
                    .reset_password(&token, &password)
                    .await
                    .context("Failed to reset password")?;
                println!("Password reset; log in with the new password");
            }
            Commands::Sitemap => {
                let today = chrono::Local::now().date_naive();
                let urls = seo::static_urls(&ctx.site(), today);
                println!("{}", seo::generate_sitemap(&urls));
            }
            Commands::Robots => {
                println!("{}", seo::generate_robots_txt(&ctx.site()));
            }
            Commands::Head {
                title,
                description,
                canonical,
                no_index,
            } => {
                let site = ctx.site();
                let page = seo::generate_seo(
                    &site,
                    SeoOverrides {
                        title,
                        description,
                        canonical,
                        no_index: Some(no_index),
                        ..SeoOverrides::default()
                    },
                );
                println!("{}", seo::render_head(&page, &site));
            }
        }

        Ok(())
    }
}

/// Turn a gateway error into a user-facing one, pointing at the login
/// command when the session ended mid-request
fn api_failure(ctx: &AppContext, err: ApiError) -> anyhow::Error {
    match err {
        ApiError::RefreshFailed(_) | ApiError::Unauthorized if !ctx.session().is_authenticated() => {
            let location = ctx.router().location();
            debug!(location = %location, "Session ended during request");
            match guard::redirect_target(&location) {
                Some(target) => anyhow::anyhow!(
                    "Session expired. Log in again with `omade login --redirect {}`",
                    target
                ),
                None => anyhow::anyhow!("Not logged in. Run `omade login` first"),
            }
        }
        other => anyhow::Error::new(other).context("Request failed"),
    }
}

fn print_navigation(navigation: &Navigation) {
    match navigation {
        Navigation::Entered(location) => println!("At {}", location),
        Navigation::Redirected { from, to } => println!("{} redirected to {}", from, to),
        Navigation::NotFound(location) => println!("No page at {}", location),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_new_password() -> Result<String> {
    let password = rpassword::prompt_password("New password: ")?;
    let confirm = rpassword::prompt_password("Confirm new password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }
    if let Err(msg) = validate_password(&password) {
        bail!("{}", msg);
    }
    Ok(password)
}
