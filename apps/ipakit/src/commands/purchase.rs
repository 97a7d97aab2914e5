//! License acquisition for zero-cost items

use ipakit_errors::{Error, StoreError};

use super::{CommandContext, CommandOutput, PurchaseOutcome};
use crate::cli::CatalogArgs;
use crate::error::CliError;

pub async fn run(
    ctx: &CommandContext,
    bundle_id: &str,
    catalog: &CatalogArgs,
) -> Result<CommandOutput, CliError> {
    let account = ctx.require_account().await?;
    let country = ctx.resolve_country(catalog.country.as_deref(), Some(&account));
    let family = ctx.resolve_device_family(catalog.device_family);

    let net = ctx.net()?;
    let app = ctx
        .catalog_client(net.clone())
        .lookup(bundle_id, &country, family)
        .await?;

    // The buy endpoint only grants zero-cost licenses; refuse paid items
    // before any store request goes out.
    if !app.is_free() {
        return Err(Error::Store(StoreError::PaidItem {
            price: format!("{:.2}", app.price),
        })
        .into());
    }

    let client = ctx.store_client(net)?;
    let already_licensed = match client.purchase(&account, app.id, &country).await {
        Ok(()) => false,
        Err(Error::Store(StoreError::DuplicateLicense)) => true,
        Err(e) => return Err(e.into()),
    };

    Ok(CommandOutput::Purchase(PurchaseOutcome {
        app_id: app.id,
        bundle_id: app.bundle_id,
        name: app.name,
        already_licensed,
    }))
}
