//! Package download, verification, and patching

use std::path::{Path, PathBuf};

use ipakit_errors::{Error, StoreError};
use ipakit_events::EventEmitter;
use ipakit_net::Download;
use ipakit_signature::SignatureClient;
use ipakit_store::Item;
use ipakit_types::App;
use rand::Rng;

use super::{CommandContext, CommandOutput, DownloadReport};
use crate::cli::CatalogArgs;
use crate::error::CliError;

pub async fn run(
    ctx: &CommandContext,
    bundle_id: &str,
    output: Option<PathBuf>,
    purchase: bool,
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

    // The grant request below acquires a missing license on its own, but
    // only for zero-cost items. When the caller asked for that, refuse
    // paid items up front instead of failing mid-protocol.
    if purchase && !app.is_free() {
        return Err(Error::Store(StoreError::PaidItem {
            price: format!("{:.2}", app.price),
        })
        .into());
    }

    let client = ctx.store_client(net.clone())?;
    let item = client.download_grant(&account, app.id, &country).await?;

    let dest = output_path(output, &app)?;
    let result = Download::new(&item.url)?
        .execute(&net, &dest, Some(&item.md5), ctx.events())
        .await?;

    if let Err(e) = apply_patches(&dest, &item, &account.email, ctx).await {
        ctx.events().emit_warning(format!(
            "patching failed; the package at {} is incomplete",
            dest.display()
        ));
        return Err(e.into());
    }

    Ok(CommandOutput::Download(DownloadReport {
        bundle_id: app.bundle_id,
        name: app.name,
        version: app.version,
        output: dest,
        size: result.size,
        md5: result.md5,
    }))
}

/// Install-ready means the archive carries the purchaser metadata and the
/// signature blob from the grant. Both writes append to the archive the
/// download just produced.
async fn apply_patches(
    dest: &Path,
    item: &Item,
    email: &str,
    ctx: &CommandContext,
) -> Result<(), Error> {
    let patcher = SignatureClient::new(dest).with_events(ctx.events().clone());
    patcher.append_metadata(item, email).await?;
    patcher.append_signature(item).await?;
    Ok(())
}

/// Where the package lands.
///
/// Without `--output` a generated name goes in the working directory. A
/// directory argument gets the generated name appended. A path to an
/// existing file is refused rather than overwritten.
fn output_path(output: Option<PathBuf>, app: &App) -> Result<PathBuf, CliError> {
    let suffix: u32 = rand::rng().random_range(100..=999);
    let file_name = format!(
        "{}_{}_v{}_{}.ipa",
        app.bundle_id, app.id, app.version, suffix
    );

    match output {
        None => Ok(PathBuf::from(file_name)),
        Some(path) if path.is_dir() => Ok(path.join(file_name)),
        Some(path) if path.exists() => Err(CliError::InvalidArguments(format!(
            "a file already exists at {}",
            path.display()
        ))),
        Some(path) => Ok(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_app() -> App {
        App {
            id: 42,
            bundle_id: "com.example.demo".to_string(),
            name: "Demo".to_string(),
            version: "1.2.3".to_string(),
            price: 0.0,
        }
    }

    #[test]
    fn generated_name_lands_in_current_dir() {
        let path = output_path(None, &demo_app()).unwrap();
        assert_eq!(path.components().count(), 1);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("com.example.demo_42_v1.2.3_"));
        assert!(name.ends_with(".ipa"));
    }

    #[test]
    fn directory_argument_gets_file_name_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(Some(dir.path().to_path_buf()), &demo_app()).unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
        assert!(path.extension().is_some_and(|e| e == "ipa"));
    }

    #[test]
    fn existing_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("taken.ipa");
        std::fs::write(&target, b"partial").unwrap();

        let err = output_path(Some(target), &demo_app()).unwrap_err();
        assert!(matches!(err, CliError::InvalidArguments(_)));
    }

    #[test]
    fn fresh_path_is_used_as_given() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("fresh.ipa");
        let path = output_path(Some(target.clone()), &demo_app()).unwrap();
        assert_eq!(path, target);
    }
}
