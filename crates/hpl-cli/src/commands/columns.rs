use crate::app::AppContext;
use crate::cli::ColumnCommand;

pub fn handle_column(ctx: &AppContext<'_>, command: &ColumnCommand) -> anyhow::Result<()> {
    let mut open = ctx.open()?;
    let message = {
        let mut head = open.document.head_mut();
        let mut options = head.options();
        match command {
            ColumnCommand::Alias { key, label } => {
                options.set_column_alias(key, label.as_str())?;
                format!("Column {} is shown as '{}'", key, label)
            }
            ColumnCommand::Unalias { key } => {
                if !options.remove_column_alias(key) {
                    return Err(anyhow::anyhow!("Column {} has no alias", key));
                }
                format!("Removed alias of column {}", key)
            }
            ColumnCommand::Order { keys } if keys.is_empty() => {
                options.clear_column_order();
                "Cleared column order".to_string()
            }
            ColumnCommand::Order { keys } => {
                options.set_column_order(keys.iter().map(String::as_str))?;
                format!("Column order: {}", keys.join(", "))
            }
            ColumnCommand::Hide { key } => {
                if !options.set_invisible_column(key)? {
                    return Err(anyhow::anyhow!("Column {} is already hidden", key));
                }
                format!("Column {} is hidden", key)
            }
            ColumnCommand::Show { key } => {
                if !options.remove_invisible_column(key) {
                    return Err(anyhow::anyhow!("Column {} is not hidden", key));
                }
                format!("Column {} is visible", key)
            }
        }
    };
    ctx.save(&mut open)?;
    if !ctx.quiet() {
        println!("{}", message);
    }
    Ok(())
}
