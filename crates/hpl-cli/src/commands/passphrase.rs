use crate::app::AppContext;
use crate::cli::PassphraseCommand;
use crate::helpers::prompt_new_passphrase;

pub fn handle_passphrase(ctx: &AppContext<'_>, command: &PassphraseCommand) -> anyhow::Result<()> {
    let mut open = ctx.open()?;
    match command {
        PassphraseCommand::Set => {
            let passphrase = prompt_new_passphrase("HPL_NEW_PASSPHRASE", ctx.interactive())?;
            let rekey = open.passphrase.is_some();
            open.passphrase = Some(passphrase);
            ctx.save(&mut open)?;
            if !ctx.quiet() {
                if rekey {
                    println!("Passphrase changed for {}", open.path().display());
                } else {
                    println!("Encrypted {}", open.path().display());
                }
            }
        }
        PassphraseCommand::Clear => {
            if open.passphrase.is_none() {
                return Err(anyhow::anyhow!("Document is not encrypted"));
            }
            open.passphrase = None;
            ctx.save(&mut open)?;
            if !ctx.quiet() {
                println!("Stored {} unencrypted", open.path().display());
            }
        }
    }
    Ok(())
}
