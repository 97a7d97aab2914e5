//! Catalog lookup by bundle identifier

use super::{CommandContext, CommandOutput};
use crate::cli::CatalogArgs;
use crate::error::CliError;

pub async fn run(
    ctx: &CommandContext,
    bundle_id: &str,
    catalog: &CatalogArgs,
) -> Result<CommandOutput, CliError> {
    let account = ctx.stored_account().await;
    let country = ctx.resolve_country(catalog.country.as_deref(), account.as_ref());
    let family = ctx.resolve_device_family(catalog.device_family);

    let client = ctx.catalog_client(ctx.net()?);
    let app = client.lookup(bundle_id, &country, family).await?;
    Ok(CommandOutput::App(app))
}
