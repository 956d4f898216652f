//! Páginas HTML del servicio, renderizadas con `format!`

use chrono::{DateTime, Utc};

use crate::domains::tokens::{IssuedToken, Token, TokenCounts, TokenStatus, ValidationOutcome};

pub const INVALID_TOKEN_MESSAGE: &str = "Token no válido";
pub const ALREADY_USED_MESSAGE: &str = "Este QR ya ha sido utilizado";
pub const SUCCESS_MESSAGE: &str = "QR validado correctamente";

/// Escapa texto libre antes de insertarlo en HTML
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
</head>
<body style="font-family: Arial, sans-serif; max-width: 720px; margin: 0 auto; padding: 20px; background-color: #f5f5f5;">
    <div style="background: white; padding: 30px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1);">
{}
    </div>
</body>
</html>
"#,
        escape_html(title),
        body
    )
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn holder_block(name: &str, surname: &str, id_number: &str) -> String {
    format!(
        r#"        <table style="width: 100%; margin: 20px 0;">
            <tr><td style="color: #666;">Nombre</td><td class="holder-name">{}</td></tr>
            <tr><td style="color: #666;">Apellido</td><td class="holder-surname">{}</td></tr>
            <tr><td style="color: #666;">DNI</td><td class="holder-id">{}</td></tr>
        </table>"#,
        escape_html(name),
        escape_html(surname),
        escape_html(id_number)
    )
}

/// GET / - formulario de emisión
pub fn index_page() -> String {
    let body = r#"        <h1 style="color: #333;">Generar QR de acceso</h1>
        <form method="post" action="/generate">
            <p><label>Nombre<br><input type="text" name="name" maxlength="100" required></label></p>
            <p><label>Apellido<br><input type="text" name="surname" maxlength="100" required></label></p>
            <p><label>DNI<br><input type="text" name="id_number" maxlength="20" required></label></p>
            <p><button type="submit">Generar QR</button></p>
        </form>"#;

    layout("Generar QR", body)
}

/// POST /generate - QR emitido con los datos del titular
pub fn issued_page(issued: &IssuedToken) -> String {
    let token = &issued.token;
    let body = format!(
        r#"        <h1 style="color: #333;">QR generado</h1>
        <div style="text-align: center;">
            <img alt="Código QR" src="{}" style="max-width: 100%;">
        </div>
{}
        <p>Enlace de validación:<br><a class="validation-url" href="{}">{}</a></p>
        <p><a href="/">Generar otro</a></p>"#,
        issued.qr.data_uri(),
        holder_block(&token.holder_name, &token.holder_surname, &token.holder_id_number),
        escape_html(&issued.validation_url),
        escape_html(&issued.validation_url)
    );

    layout("QR generado", &body)
}

/// GET /validate/{token} - resultado de la validación
pub fn validation_page(outcome: &ValidationOutcome) -> String {
    match outcome {
        ValidationOutcome::Success(token) => {
            let body = format!(
                r#"        <h1 style="color: #2f855a;" data-outcome="success">{}</h1>
{}"#,
                SUCCESS_MESSAGE,
                holder_block(&token.holder_name, &token.holder_surname, &token.holder_id_number)
            );
            layout("Validación exitosa", &body)
        }
        ValidationOutcome::AlreadyUsed => error_page("already_used", ALREADY_USED_MESSAGE),
        ValidationOutcome::Invalid => error_page("invalid", INVALID_TOKEN_MESSAGE),
    }
}

fn error_page(outcome: &str, message: &str) -> String {
    let body = format!(
        r#"        <h1 style="color: #c53030;" data-outcome="{}">{}</h1>"#,
        outcome,
        escape_html(message)
    );
    layout("Error de validación", &body)
}

/// GET /admin - listado de tokens, más recientes primero
pub fn admin_page(tokens: &[Token], counts: TokenCounts) -> String {
    let rows = if tokens.is_empty() {
        r#"            <tr><td colspan="8" style="color: #666;">No hay tokens emitidos.</td></tr>"#.to_string()
    } else {
        tokens
            .iter()
            .map(|t| {
                let status = match t.status {
                    TokenStatus::Pending => "Pendiente",
                    TokenStatus::Used => "Usado",
                };
                format!(
                    r#"            <tr data-status="{}"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}</td></tr>"#,
                    t.status,
                    t.id,
                    escape_html(&t.holder_name),
                    escape_html(&t.holder_surname),
                    escape_html(&t.holder_id_number),
                    status,
                    escape_html(&t.token),
                    format_timestamp(&t.created_at),
                    t.used_at.as_ref().map(format_timestamp).unwrap_or_else(|| "-".to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let body = format!(
        r#"        <h1 style="color: #333;">Tokens emitidos</h1>
        <p>Total: {} &middot; Pendientes: {} &middot; Usados: {}</p>
        <table style="width: 100%; border-collapse: collapse; font-size: 14px;">
            <tr><th>ID</th><th>Nombre</th><th>Apellido</th><th>DNI</th><th>Estado</th><th>Token</th><th>Creado</th><th>Usado</th></tr>
{}
        </table>"#,
        counts.total(),
        counts.pending,
        counts.used,
        rows
    );

    layout("Administración", &body)
}
