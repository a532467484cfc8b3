//! # Settings Commands
//!
//! `:settings` shows the store header and terminal configuration;
//! `:set <key> <value>` edits the persisted store settings.

use pdv_core::{CollectionStore, Settings};
use tracing::info;

use crate::error::CommandError;
use crate::state::Session;

const KEYS: &str = "name, document, address, phone, footer, currency";

/// Renders the current settings.
pub fn show<S: CollectionStore>(session: &Session<S>) -> String {
    let settings = session.settings();
    let config = session.config();

    let mut out = vec![
        format!("Loja:       {}", settings.store_name),
        format!("Documento:  {}", or_dash(&settings.document)),
        format!("Endereço:   {}", or_dash(&settings.address_lines.join(" | "))),
        format!("Telefone:   {}", or_dash(settings.phone.as_deref().unwrap_or(""))),
        format!("Rodapé:     {}", or_dash(&settings.receipt_footer)),
        format!(
            "Moeda:      {} (1{}234{}56)",
            settings.currency_symbol, settings.thousands_separator, settings.decimal_separator
        ),
        String::new(),
        format!("Operador:   {}", config.cashier_name),
        format!("Estoque:    {}", config.stock_policy.as_str()),
        format!(
            "Leitor:     {}",
            config
                .scanner_device
                .as_ref()
                .map_or_else(|| "-".to_string(), |p| p.display().to_string())
        ),
        format!("Cupom:      {} colunas", config.receipt_width),
    ];
    if let Ok(path) = config.database_path() {
        out.push(format!("Banco:      {}", path.display()));
    }
    out.join("\n")
}

/// Updates one settings field and persists it.
pub async fn set<S: CollectionStore>(
    session: &mut Session<S>,
    key: &str,
    value: &str,
) -> Result<String, CommandError> {
    let mut settings = session.settings().clone();
    apply(&mut settings, key, value)?;
    session.update_settings(settings).await?;

    info!(key = %key, "Settings updated");
    Ok(format!("{} = {}", key, value))
}

fn apply(settings: &mut Settings, key: &str, value: &str) -> Result<(), CommandError> {
    match key.to_lowercase().as_str() {
        "name" | "nome" => settings.store_name = value.to_string(),
        "document" | "documento" | "cnpj" => settings.document = value.to_string(),
        "address" | "endereco" | "endereço" => {
            settings.address_lines = value
                .split('|')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
        }
        "phone" | "telefone" => {
            settings.phone = Some(value.to_string()).filter(|p| p != "-");
        }
        "footer" | "rodape" | "rodapé" => settings.receipt_footer = value.to_string(),
        "currency" | "moeda" => settings.currency_symbol = value.to_string(),
        other => {
            return Err(CommandError::usage(format!(
                "unknown setting '{}' (one of: {})",
                other, KEYS
            )))
        }
    }
    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
