use crate::commands::Session;
use crate::error::Result;

pub async fn run(session: &Session) -> Result<()> {
    let limits = session.client.rate_limit().await?;
    println!("{}", serde_json::to_string_pretty(&limits)?);
    Ok(())
}
