use color_eyre::eyre::bail;
use saml_sp::{ServiceProvider, config::Config, telemetry};

/// Print a login URL (`redirect`, the default) or an auto-submitting POST
/// form (`post`) for the configured IdP.
///
/// Usage: `saml-sp [redirect|post] [relay-state]`
fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let config = Config::load()?;
    let sp = ServiceProvider::new(config.service_provider()?)?;
    tracing::info!(
        sso_url = %sp.config().identity_provider_sso_url,
        signed = sp.signer().is_some(),
        "Loaded service provider"
    );

    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "redirect".to_string());
    let relay_state = args.next();

    match mode.as_str() {
        "redirect" => println!("{}", sp.build_auth_url(relay_state.as_deref())?),
        "post" => println!("{}", sp.auth_post_form(relay_state.as_deref())?.0),
        other => bail!("unknown binding {other:?}, expected `redirect` or `post`"),
    }
    Ok(())
}
