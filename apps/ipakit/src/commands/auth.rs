//! Sign-in, session info, and sign-out

use ipakit_errors::{Error, KeychainError, StoreError};
use ipakit_keychain::{delete_account, load_account, save_account};
use ipakit_types::Credentials;
use std::io::{self, Write};

use super::{AccountSummary, CommandContext, CommandOutput};
use crate::error::CliError;

/// Sign in and persist the session.
///
/// A missing password is prompted for in interactive sessions. When the
/// backend asks for a verification code and none was supplied, the code is
/// prompted for and the sign-in is repeated once with the code attached.
pub async fn login(
    ctx: &CommandContext,
    email: String,
    password: Option<String>,
    auth_code: Option<String>,
) -> Result<CommandOutput, CliError> {
    let password = match password {
        Some(password) => password,
        None if ctx.interactive() => prompt_password()?,
        None => {
            return Err(CliError::InvalidArguments(
                "a password is required when running non-interactively; \
                 pass --password or set IPAKIT_PASSWORD"
                    .to_string(),
            ))
        }
    };

    let client = ctx.store_client(ctx.net()?)?;
    let supplied_code = auth_code.is_some();

    let mut credentials = Credentials::new(email, password);
    if let Some(code) = auth_code {
        credentials = credentials.with_auth_code(code);
    }

    let first = client.authenticate(&credentials).await;
    let account = match first {
        Ok(account) => account,
        Err(Error::Store(StoreError::CodeRequired)) if ctx.interactive() && !supplied_code => {
            let code = prompt_auth_code()?;
            client
                .authenticate(&credentials.with_auth_code(code))
                .await?
        }
        Err(e) => return Err(e.into()),
    };

    let store = ctx.credential_store()?;
    save_account(&store, &account).await?;

    Ok(CommandOutput::Account(AccountSummary::from(&account)))
}

/// Show the stored session.
pub async fn info(ctx: &CommandContext) -> Result<CommandOutput, CliError> {
    let store = ctx.credential_store()?;
    let account = load_account(&store)
        .await?
        .ok_or(Error::Keychain(KeychainError::NoAccount))?;
    Ok(CommandOutput::Account(AccountSummary::from(&account)))
}

/// Delete the stored session.
pub async fn revoke(ctx: &CommandContext) -> Result<CommandOutput, CliError> {
    let store = ctx.credential_store()?;
    let account = load_account(&store)
        .await?
        .ok_or(Error::Keychain(KeychainError::NoAccount))?;
    delete_account(&store).await?;
    Ok(CommandOutput::Revoked { name: account.name })
}

fn prompt_password() -> Result<String, CliError> {
    rpassword::prompt_password("Apple ID password: ").map_err(CliError::Io)
}

fn prompt_auth_code() -> Result<String, CliError> {
    print!("2FA code: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
