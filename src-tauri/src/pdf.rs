use genpdf::elements::{Break, LinearLayout, PaddedElement, Paragraph, StyledElement, TableLayout};
use genpdf::style::{Color, Style};
use genpdf::{Alignment, Document, Element, Margins, SimplePageDecorator};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{DiscountType, PricingUnit, QuoteWithItems, Settings};
use crate::pricing;

const MONTHS: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro", "Outubro",
    "Novembro", "Dezembro",
];

const SIGN_URL: &str = "https://assinador.iti.br/assinatura/index.xhtml";

const BLUE: Color = Color::Rgb(37, 99, 235);
const TEXT_SECONDARY: Color = Color::Rgb(100, 116, 139);
const GREEN: Color = Color::Rgb(22, 163, 74);

// ============================================
// HELPERS
// ============================================

fn p(text: &str, style: Style) -> StyledElement<Paragraph> {
    Paragraph::new(text).styled(style)
}

fn p_center(text: &str, style: Style) -> impl Element {
    Paragraph::new(text).aligned(Alignment::Center).styled(style)
}

/// Parágrafo com padding (esquerdo 3mm) para células de tabela
fn pp(text: &str, style: Style) -> PaddedElement<StyledElement<Paragraph>> {
    Paragraph::new(text).styled(style).padded(Margins::trbl(1, 1, 1, 3))
}

/// Valores monetários alinhados à direita
fn pp_right(text: &str, style: Style) -> impl Element {
    Paragraph::new(text).aligned(Alignment::Right).styled(style).padded(Margins::trbl(1, 3, 1, 1))
}

/// `R$ 1.234,56`
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("R$ {}{},{:02}", sign, grouped, cents % 100)
}

fn format_quantity(quantity: f64, unit: PricingUnit) -> String {
    match unit {
        PricingUnit::Metro => format!("{:.2}m", quantity).replace('.', ","),
        PricingUnit::Unidade if quantity == quantity.floor() => format!("{:.0} un", quantity),
        PricingUnit::Unidade => format!("{:.2} un", quantity).replace('.', ","),
    }
}

/// "Criado em 27 de Janeiro de 2026". Sem data válida usa hoje.
pub fn long_date(created_at: Option<&str>) -> String {
    use chrono::Datelike;

    let date = created_at
        .and_then(|d| d.get(..10))
        .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let month = MONTHS[date.month0() as usize];
    format!("Criado em {} de {} de {}", date.day(), month, date.year())
}

pub fn quote_code(id: i64) -> String {
    format!("[OR.{:04}]", id)
}

/// Título do serviço a partir dos produtos. Observação técnica curta
/// (até 60 caracteres) substitui o título.
pub fn service_title(quote: &QuoteWithItems) -> String {
    let notes = quote.quote.technical_notes.trim();
    if !notes.is_empty() && notes.chars().count() <= 60 {
        return notes.to_string();
    }
    if quote.items.is_empty() {
        return "Orçamento de Serviços".to_string();
    }

    let mut kinds: Vec<String> = Vec::new();
    for item in &quote.items {
        let name = item.product_name.to_lowercase();
        let kind = ["calha", "rufo", "pingadeira"]
            .iter()
            .find(|k| name.contains(*k))
            .map(|k| format!("{}s", k))
            .unwrap_or_else(|| item.product_name.clone());
        if !kind.is_empty() && !kinds.iter().any(|k| k.to_lowercase() == kind.to_lowercase()) {
            kinds.push(kind);
        }
    }

    if kinds.is_empty() {
        "Serviço de Calhas".to_string()
    } else {
        format!("Instalação de {}", kinds.join(" e "))
    }
}

fn payment_label(method: &str) -> &str {
    match method {
        "pix" => "PIX",
        "debito" => "Débito",
        "credito" => "Crédito",
        "dinheiro" => "Dinheiro",
        "transferencia" => "Transferência",
        "boleto" => "Boleto",
        other => other,
    }
}

/// `Orcamento_<cliente>_<AAAAMMDD>.pdf`
pub fn pdf_filename(client_name: &str) -> String {
    let client = client_name.trim();
    let safe: String = if client.is_empty() { "Cliente" } else { client }
        .chars()
        .map(|c| if c.is_whitespace() || matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("Orcamento_{}_{}.pdf", safe, chrono::Local::now().format("%Y%m%d"))
}

/// Logo convertido para PNG RGB em arquivo temporário, com a escala que
/// ocupa no máximo 40x25mm (genpdf: mm = 25.4 * escala * pixels / 300)
fn logo_element(bytes: &[u8]) -> Option<impl Element> {
    let img = image::load_from_memory(bytes).ok()?.to_rgb8();
    let (w, h) = (img.width() as f64, img.height() as f64);
    if w == 0.0 || h == 0.0 {
        return None;
    }

    let path = std::env::temp_dir().join(format!("calhagest_logo_{}.png", std::process::id()));
    img.save(&path).ok()?;
    let logo = genpdf::elements::Image::from_path(&path);
    let _ = std::fs::remove_file(&path);

    let scale = (40.0 * 300.0 / (25.4 * w)).min(25.0 * 300.0 / (25.4 * h));
    let logo = logo
        .ok()?
        .with_alignment(Alignment::Center)
        .with_scale(genpdf::Scale::new(scale, scale));
    Some(logo.padded(Margins::trbl(0, 0, 3, 0)))
}

// ============================================
// GERADOR DO ORÇAMENTO
// ============================================

/// Monta o PDF A4 do orçamento e devolve os bytes
pub fn render_quote_pdf(
    quote: &QuoteWithItems,
    settings: &Settings,
    logo: Option<&[u8]>,
    fonts_dir: &Path,
) -> AppResult<Vec<u8>> {
    let font_family = genpdf::fonts::from_files(fonts_dir, "LiberationSans", None).map_err(|e| {
        AppError::Pdf(format!(
            "Erro ao carregar fontes em {}: {}. Copie os arquivos LiberationSans-*.ttf para essa pasta.",
            fonts_dir.display(),
            e
        ))
    })?;

    let q = &quote.quote;
    let id = q.id.unwrap_or_default();

    let mut doc = Document::new(font_family);
    doc.set_title(format!("Orçamento {}", quote_code(id)));

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(Margins::trbl(15, 15, 20, 15));
    doc.set_page_decorator(decorator);

    let s_normal = Style::new().with_font_size(10);
    let s_small = Style::new().with_font_size(9);
    let s_bold = Style::new().with_font_size(10).bold();
    let s_secondary = Style::new().with_font_size(9).with_color(TEXT_SECONDARY);
    let s_company = Style::new().with_font_size(16).bold().with_color(BLUE);
    let s_title = Style::new().with_font_size(14).bold();
    let s_section = Style::new().with_font_size(12).bold().with_color(BLUE);
    let s_subtotal = Style::new().with_font_size(10).bold().with_color(GREEN);
    let s_total = Style::new().with_font_size(13).bold();

    // --- Empresa ---
    if let Some(logo) = logo.and_then(logo_element) {
        doc.push(logo);
    }
    doc.push(p_center(&settings.company_name, s_company));
    for info in [&settings.company_cnpj, &settings.company_address, &settings.company_phone, &settings.company_email] {
        if !info.trim().is_empty() {
            doc.push(p_center(info.trim(), s_secondary));
        }
    }
    doc.push(Break::new(1.5));

    // --- Título ---
    doc.push(p_center(&service_title(quote), s_title));
    doc.push(p_center(&quote_code(id), s_secondary));
    doc.push(Break::new(0.5));

    let mut client = LinearLayout::vertical();
    client.push(p(&format!("Cliente: {}", q.client_name), s_normal));
    if !q.client_address.trim().is_empty() {
        client.push(p(&format!("Endereço: {}", q.client_address.trim()), s_normal));
    }
    if !q.client_phone.trim().is_empty() {
        client.push(p(&format!("Telefone: {}", q.client_phone.trim()), s_normal));
    }
    if let Some(date) = q.scheduled_date.as_deref().filter(|d| !d.trim().is_empty()) {
        client.push(p(&format!("Data prevista: {}", date), s_normal));
    }
    doc.push(client.padded(Margins::trbl(2, 3, 2, 3)).framed());
    doc.push(Break::new(1.0));

    // --- Descrição longa ---
    let notes = q.technical_notes.trim();
    if notes.chars().count() > 60 {
        doc.push(p("Descrição das atividades", s_section));
        doc.push(Break::new(0.5));
        doc.push(p(notes, s_normal));
        doc.push(Break::new(1.0));
    }

    // --- Preços ---
    doc.push(p("Preços", s_section));
    doc.push(Break::new(0.5));

    if !quote.items.is_empty() {
        let mut table = TableLayout::new(vec![35, 15, 22, 28]);
        table.set_cell_decorator(genpdf::elements::FrameCellDecorator::new(true, true, false));
        table
            .row()
            .element(pp("Produto", s_bold))
            .element(pp("Qtde.", s_bold))
            .element(pp_right("Valor unitário", s_bold))
            .element(pp_right("Subtotal", s_bold))
            .push()
            .map_err(|e| AppError::Pdf(format!("Erro no cabeçalho da tabela: {}", e)))?;

        for item in &quote.items {
            let measure = item.measure.trunc();
            let name = if measure > 0.0 {
                format!("{} ({:.0}cm)", item.product_name, measure)
            } else {
                item.product_name.clone()
            };
            table
                .row()
                .element(pp(&name, s_small))
                .element(pp(&format_quantity(item.meters, item.pricing_unit), s_small))
                .element(pp_right(&format_currency(item.price_per_meter), s_small))
                .element(pp_right(&format_currency(item.total), s_subtotal))
                .push()
                .map_err(|e| AppError::Pdf(format!("Erro na linha da tabela: {}", e)))?;
        }
        doc.push(table);
        doc.push(Break::new(1.0));
    }

    let subtotal = quote.subtotal();
    let discount = pricing::discount_amount(subtotal, q.discount_total, q.discount_type);
    let mut totals = TableLayout::new(vec![1, 1]);
    let mut lines: Vec<(String, f64, Style)> = Vec::new();
    if discount > 0.0 {
        let label = match q.discount_type {
            DiscountType::Percentage => format!("Desconto ({}%)", q.discount_total),
            DiscountType::Value => "Desconto".to_string(),
        };
        lines.push(("Subtotal".to_string(), subtotal, s_normal));
        lines.push((label, -discount, s_normal));
    }
    lines.push(("Total".to_string(), q.total, s_total));
    for (label, value, style) in &lines {
        totals
            .row()
            .element(pp(label, *style))
            .element(pp_right(&format_currency(*value), *style))
            .push()
            .map_err(|e| AppError::Pdf(format!("Erro nos totais: {}", e)))?;
    }
    doc.push(totals);
    doc.push(Break::new(1.5));

    // --- Pagamento ---
    let methods = q.payment_method_list();
    if !methods.is_empty() {
        let labels: Vec<&str> = methods.iter().map(|m| payment_label(m)).collect();
        doc.push(p("Métodos de pagamento", s_section));
        doc.push(Break::new(0.5));
        doc.push(p(&labels.join("   |   "), s_normal));
        doc.push(Break::new(1.5));
    }

    // --- Contrato ---
    let contract = q.contract_terms.trim();
    if !contract.is_empty() {
        doc.push(p("Condições de contrato", s_section));
        doc.push(Break::new(0.5));
        doc.push(p(contract, s_small));
        doc.push(Break::new(1.5));
    }

    // --- Assinaturas ---
    doc.push(Break::new(3.0));
    let mut signatures = TableLayout::new(vec![1, 1]);
    let line = "_______________________________";
    signatures
        .row()
        .element(p_center(line, s_normal))
        .element(p_center(line, s_normal))
        .push()
        .map_err(|e| AppError::Pdf(format!("Erro nas assinaturas: {}", e)))?;
    signatures
        .row()
        .element(p_center(&settings.company_name, s_normal))
        .element(p_center("Cliente", s_normal))
        .push()
        .map_err(|e| AppError::Pdf(format!("Erro nas assinaturas: {}", e)))?;
    doc.push(signatures);
    doc.push(Break::new(2.0));

    doc.push(p_center(&long_date(q.created_at.as_deref()), s_normal));
    doc.push(Break::new(1.0));
    doc.push(p_center(&format!("Assinar documento: {}", SIGN_URL), s_secondary));

    let mut buffer = Vec::new();
    doc.render(&mut buffer)
        .map_err(|e| AppError::Pdf(format!("Erro ao gerar PDF: {}", e)))?;

    Ok(buffer)
}

/// Gera o PDF do orçamento. Sem `output`, grava em `config.pdf_dir`.
pub fn generate_quote_pdf(
    quote: &QuoteWithItems,
    settings: &Settings,
    logo: Option<&[u8]>,
    config: &AppConfig,
    output: Option<&Path>,
) -> AppResult<PathBuf> {
    let bytes = render_quote_pdf(quote, settings, logo, &config.fonts_dir)?;

    let path = match output {
        Some(p) => p.to_path_buf(),
        None => config.pdf_dir.join(pdf_filename(&quote.quote.client_name)),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, bytes)?;

    log::info!("PDF do orçamento {} salvo em {}", quote_code(quote.quote.id.unwrap_or_default()), path.display());
    Ok(path)
}

/// Busca orçamento, configurações e logo no banco e gera o PDF
pub fn export_quote_pdf(db: &Database, quote_id: i64, output: Option<&Path>) -> AppResult<PathBuf> {
    let quote = db.get_quote(quote_id)?;
    let settings = db.get_settings()?;
    let logo = db.company_logo()?;
    generate_quote_pdf(&quote, &settings, logo.as_deref(), &db.config, output)
}
