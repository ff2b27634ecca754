use anyhow::Result;

use crate::session::Session;

pub async fn login(session: &mut Session) -> Result<()> {
    if let Some(user) = session.user() {
        println!(
            "You are already logged in as {} on {}.",
            user.username,
            session.config().api_host
        );
        return Ok(());
    }

    let user = session.login().await?;
    println!("\nHello {}, nice to see you!", user.username);
    Ok(())
}

pub fn logout(session: &mut Session) -> Result<()> {
    let host = session.config().api_host.clone();
    if session.logout()? {
        println!("Logged out from {}.", host);
    } else {
        println!("No stored credentials for {}.", host);
    }
    Ok(())
}
