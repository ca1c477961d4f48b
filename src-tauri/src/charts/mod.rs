//! Gráficos PNG da tela de análises, desenhados direto no buffer de pixels.

mod font;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{ExpenseCategory, MonthlyAnalytics, QuoteStatus, StatusCount};
use base64::Engine;
use font::{draw_text, text_height, text_width};
use image::{Rgb, RgbImage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const BG: Rgb<u8> = Rgb([0xfa, 0xfb, 0xfc]);
const TEXT: Rgb<u8> = Rgb([0x1e, 0x29, 0x3b]);
const GRID: Rgb<u8> = Rgb([0xe2, 0xe8, 0xf0]);
const AXIS: Rgb<u8> = Rgb([0x64, 0x74, 0x8b]);
const WHITE: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const PRIMARY: Rgb<u8> = Rgb([0x25, 0x63, 0xeb]);
const SUCCESS: Rgb<u8> = Rgb([0x10, 0xb9, 0x81]);
const ERROR: Rgb<u8> = Rgb([0xef, 0x44, 0x44]);

const PALETTE: [Rgb<u8>; 8] = [
    PRIMARY,
    SUCCESS,
    Rgb([0xf5, 0x9e, 0x0b]),
    ERROR,
    Rgb([0x8b, 0x5c, 0xf6]),
    Rgb([0xec, 0x48, 0x99]),
    Rgb([0x06, 0xb6, 0xd4]),
    Rgb([0x84, 0xcc, 0x16]),
];

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 500;
const MARGIN: u32 = 50;
/// Topo do título e da legenda, dentro da margem superior
const TITLE_Y: i64 = 15;
const SWATCH: i64 = 12;

fn status_color(status: QuoteStatus) -> Rgb<u8> {
    match status {
        QuoteStatus::Draft => Rgb([0x9c, 0xa3, 0xaf]),
        QuoteStatus::Sent => Rgb([0x3b, 0x82, 0xf6]),
        QuoteStatus::Approved => Rgb([0x22, 0xc5, 0x5e]),
        QuoteStatus::Completed => Rgb([0xa8, 0x55, 0xf7]),
    }
}

/// Área de plotagem e escala vertical `lo..hi`
struct Plot {
    left: i64,
    right: i64,
    top: i64,
    bottom: i64,
    lo: f64,
    hi: f64,
}

impl Plot {
    fn new(width: u32, height: u32, lo: f64, hi: f64) -> Self {
        let hi = if hi <= lo { lo + 1.0 } else { hi };
        Plot {
            left: MARGIN as i64,
            right: (width - MARGIN) as i64,
            top: MARGIN as i64,
            bottom: (height - MARGIN) as i64,
            lo,
            hi,
        }
    }

    fn width(&self) -> f64 {
        (self.right - self.left) as f64
    }

    fn y(&self, value: f64) -> i64 {
        let ratio = (value - self.lo) / (self.hi - self.lo);
        self.bottom - (ratio * (self.bottom - self.top) as f64).round() as i64
    }

    /// Linhas de grade com os valores à esquerda, e os eixos
    fn draw_frame(&self, img: &mut RgbImage) {
        for i in 0..=4 {
            let y = self.top + (self.bottom - self.top) * i / 4;
            fill_rect(img, self.left, y, self.right, y, GRID);

            let value = format!("{:.0}", self.hi - (self.hi - self.lo) * i as f64 / 4.0);
            let label_x = self.left - 6 - text_width(&value, 1);
            draw_text(img, label_x, y - text_height(1) / 2, &value, 1, AXIS);
        }
        fill_rect(img, self.left, self.top, self.left, self.bottom, AXIS);
        let zero = self.y(0.0).clamp(self.top, self.bottom);
        fill_rect(img, self.left, zero, self.right, zero, AXIS);
    }

    /// Rótulo centralizado abaixo do eixo horizontal
    fn draw_x_label(&self, img: &mut RgbImage, center: i64, text: &str) {
        draw_text(img, center - text_width(text, 2) / 2, self.bottom + 10, text, 2, TEXT);
    }
}

fn draw_title(img: &mut RgbImage, title: &str) {
    draw_text(img, MARGIN as i64, TITLE_Y, title, 2, TEXT);
}

/// Legenda em linha terminando em `right`
fn draw_legend(img: &mut RgbImage, right: i64, items: &[(&str, Rgb<u8>)]) {
    let entry = |label: &str| SWATCH + 6 + text_width(label, 2) + 20;
    let mut x = right - items.iter().map(|&(label, _)| entry(label)).sum::<i64>() + 20;
    for &(label, color) in items {
        fill_rect(img, x, TITLE_Y + 1, x + SWATCH - 1, TITLE_Y + SWATCH, color);
        draw_text(img, x + SWATCH + 6, TITLE_Y, label, 2, TEXT);
        x += entry(label);
    }
}

/// `2026-09` vira `09/26`
fn month_label(month: &str) -> String {
    match month.split_once('-') {
        Some((year, m)) if year.len() == 4 => format!("{}/{}", m, &year[2..]),
        _ => month.to_string(),
    }
}

fn category_label(key: &str) -> String {
    key.parse::<ExpenseCategory>()
        .map(|c| c.label().to_string())
        .unwrap_or_else(|_| key.to_string())
}

/// Retângulo preenchido com os dois cantos inclusos, recortado à imagem
fn fill_rect(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let (xa, xb) = (x0.min(x1).max(0), x0.max(x1).min(w - 1));
    let (ya, yb) = (y0.min(y1).max(0), y0.max(y1).min(h - 1));
    for y in ya..=yb {
        for x in xa..=xb {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn fill_circle(img: &mut RgbImage, cx: i64, cy: i64, r: i64, color: Rgb<u8>) {
    for y in (cy - r)..=(cy + r) {
        for x in (cx - r)..=(cx + r) {
            let inside = (x - cx).pow(2) + (y - cy).pow(2) <= r * r;
            if inside && x >= 0 && y >= 0 && x < img.width() as i64 && y < img.height() as i64 {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), thickness: i64, color: Rgb<u8>) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).max(1);
    let half = thickness / 2;
    for s in 0..=steps {
        let x = from.0 + (to.0 - from.0) * s / steps;
        let y = from.1 + (to.1 - from.1) * s / steps;
        fill_rect(img, x - half, y - half, x + half, y + half, color);
    }
}

/// Faturamento e custo por mês em barras lado a lado. Recebe os meses do
/// mais recente para o mais antigo, como vem da análise mensal.
pub fn revenue_vs_cost_chart(data: &[MonthlyAnalytics]) -> Option<RgbImage> {
    if data.is_empty() {
        return None;
    }
    let months: Vec<&MonthlyAnalytics> = data.iter().rev().collect();
    let max = months.iter().map(|m| m.revenue.max(m.cost)).fold(0.0, f64::max);

    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BG);
    let plot = Plot::new(WIDTH, HEIGHT, 0.0, max);
    plot.draw_frame(&mut img);
    draw_title(&mut img, "Faturamento x custo");
    draw_legend(&mut img, plot.right, &[("Faturamento", PRIMARY), ("Custo", ERROR)]);

    let group = plot.width() / months.len() as f64;
    let bar = (group * 0.35).max(1.0);
    for (i, month) in months.iter().enumerate() {
        let center = plot.left as f64 + group * (i as f64 + 0.5);
        plot.draw_x_label(&mut img, center.round() as i64, &month_label(&month.month));
        for (value, offset, color) in [(month.revenue, -bar, PRIMARY), (month.cost, 0.0, ERROR)] {
            if value <= 0.0 {
                continue;
            }
            let x0 = (center + offset).round() as i64;
            let x1 = (center + offset + bar).round() as i64 - 1;
            fill_rect(&mut img, x0, plot.y(value), x1, plot.bottom - 1, color);
        }
    }
    Some(img)
}

/// Linhas de faturamento e lucro em ordem cronológica
pub fn profit_evolution_chart(data: &[MonthlyAnalytics]) -> Option<RgbImage> {
    if data.is_empty() {
        return None;
    }
    let months: Vec<&MonthlyAnalytics> = data.iter().rev().collect();
    let hi = months.iter().map(|m| m.revenue.max(m.profit)).fold(0.0, f64::max);
    let lo = months.iter().map(|m| m.profit.min(m.revenue)).fold(0.0, f64::min);

    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BG);
    let plot = Plot::new(WIDTH, HEIGHT, lo, hi);
    plot.draw_frame(&mut img);
    draw_title(&mut img, "Evolução do lucro");
    draw_legend(&mut img, plot.right, &[("Faturamento", PRIMARY), ("Lucro", SUCCESS)]);

    let step = plot.width() / months.len() as f64;
    let x = |i: usize| (plot.left as f64 + step * (i as f64 + 0.5)).round() as i64;
    for (i, month) in months.iter().enumerate() {
        plot.draw_x_label(&mut img, x(i), &month_label(&month.month));
    }

    for (series, color) in [(0, PRIMARY), (1, SUCCESS)] {
        let value = |m: &MonthlyAnalytics| if series == 0 { m.revenue } else { m.profit };
        let points: Vec<(i64, i64)> = months.iter().enumerate().map(|(i, m)| (x(i), plot.y(value(m)))).collect();

        for pair in points.windows(2) {
            draw_line(&mut img, pair[0], pair[1], 3, color);
        }
        for &(px, py) in &points {
            fill_circle(&mut img, px, py, 7, color);
            fill_circle(&mut img, px, py, 4, WHITE);
        }
    }
    Some(img)
}

/// Pizza das fatias positivas, começando no topo em sentido horário,
/// com a legenda à direita. `None` quando nenhum valor é positivo.
pub fn pie_chart(title: &str, values: &[(String, f64)]) -> Option<RgbImage> {
    let slices: Vec<&(String, f64)> = values.iter().filter(|(_, v)| *v > 0.0).collect();
    let total: f64 = slices.iter().map(|(_, v)| v).sum();
    if slices.is_empty() || total <= 0.0 {
        return None;
    }

    let size = 800u32;
    let legend_width = 300u32;
    let mut img = RgbImage::from_pixel(size + legend_width, size, BG);
    let (c, r) = (size as f64 / 2.0, size as f64 / 2.0 - MARGIN as f64);

    let mut bounds = Vec::with_capacity(slices.len());
    let mut acc = 0.0;
    for (_, v) in &slices {
        acc += v / total;
        bounds.push(acc);
    }

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let (dx, dy) = (x as f64 + 0.5 - c, y as f64 + 0.5 - c);
        if dx * dx + dy * dy > r * r {
            continue;
        }
        // 0 no topo, crescendo no sentido horário
        let angle = dx.atan2(-dy).rem_euclid(std::f64::consts::TAU) / std::f64::consts::TAU;
        let slice = bounds.iter().position(|b| angle < *b).unwrap_or(slices.len() - 1);
        *pixel = PALETTE[slice % PALETTE.len()];
    }

    draw_title(&mut img, title);
    let legend_x = size as i64;
    for (i, (label, value)) in slices.iter().enumerate() {
        let y = MARGIN as i64 + i as i64 * 30;
        fill_rect(&mut img, legend_x, y + 1, legend_x + SWATCH - 1, y + SWATCH, PALETTE[i % PALETTE.len()]);
        let text = format!("{} ({:.0}%)", label, value / total * 100.0);
        draw_text(&mut img, legend_x + SWATCH + 6, y, &text, 2, TEXT);
    }
    Some(img)
}

/// Barras por status. `None` sem nenhum orçamento.
pub fn quotes_by_status_chart(counts: &[StatusCount]) -> Option<RgbImage> {
    let max = counts.iter().map(|c| c.count).max().unwrap_or(0);
    if max <= 0 {
        return None;
    }

    let (width, height) = (800, 500);
    let mut img = RgbImage::from_pixel(width, height, BG);
    let plot = Plot::new(width, height, 0.0, max as f64);
    plot.draw_frame(&mut img);
    draw_title(&mut img, "Orçamentos por status");

    let slot = plot.width() / counts.len() as f64;
    for (i, status) in counts.iter().enumerate() {
        let center = (plot.left as f64 + slot * (i as f64 + 0.5)).round() as i64;
        plot.draw_x_label(&mut img, center, status.status.label());
        if status.count == 0 {
            continue;
        }
        let count = status.count.to_string();
        let top = plot.y(status.count as f64);
        draw_text(&mut img, center - text_width(&count, 2) / 2, top - 18, &count, 2, TEXT);
        let x0 = (plot.left as f64 + slot * (i as f64 + 0.2)).round() as i64;
        let x1 = (plot.left as f64 + slot * (i as f64 + 0.8)).round() as i64;
        fill_rect(
            &mut img,
            x0,
            top,
            x1,
            plot.bottom - 1,
            status_color(status.status),
        );
    }
    Some(img)
}

pub fn save_chart(img: &RgbImage, path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    img.save(path)
        .map_err(|e| AppError::Chart(format!("Erro ao salvar gráfico: {}", e)))
}

/// PNG em base64 para exibir direto na interface
pub fn chart_base64(img: &RgbImage) -> AppResult<String> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png)
        .map_err(|e| AppError::Chart(format!("Erro ao gerar gráfico: {}", e)))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(buf.into_inner()))
}

/// Gráficos que têm dados, com o nome do arquivo
pub fn build_charts(db: &Database) -> AppResult<Vec<(&'static str, RgbImage)>> {
    let monthly = db.monthly_analytics()?;
    let by_status = db.quotes_by_status()?;
    let expenses = db.expenses_summary()?;
    let categories: Vec<(String, f64)> = expenses
        .by_category
        .iter()
        .map(|(key, total)| (category_label(key), *total))
        .collect();

    let charts = [
        ("profit_vs_cost", revenue_vs_cost_chart(&monthly)),
        ("profit_evolution", profit_evolution_chart(&monthly)),
        ("quotes_by_status", quotes_by_status_chart(&by_status)),
        ("expenses_by_category", pie_chart("Despesas por categoria", &categories)),
    ];
    Ok(charts
        .into_iter()
        .filter_map(|(name, img)| img.map(|img| (name, img)))
        .collect())
}

/// Grava os gráficos em `config.charts_dir`; nome -> caminho
pub fn save_all_charts(db: &Database) -> AppResult<BTreeMap<String, PathBuf>> {
    let mut saved = BTreeMap::new();
    for (name, img) in build_charts(db)? {
        let path = db.config.charts_dir.join(format!("{}.png", name));
        save_chart(&img, &path)?;
        saved.insert(name.to_string(), path);
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::quotes::tests::new_quote;

    fn month(month: &str, revenue: f64, cost: f64) -> MonthlyAnalytics {
        MonthlyAnalytics {
            month: month.to_string(),
            quote_count: 1,
            revenue,
            cost,
            profit: revenue - cost,
        }
    }

    #[test]
    fn test_sem_dados() {
        assert!(revenue_vs_cost_chart(&[]).is_none());
        assert!(profit_evolution_chart(&[]).is_none());
        assert!(pie_chart("Despesas", &[("Geral".into(), 0.0), ("Outros".into(), -2.0)]).is_none());
        let zeros: Vec<StatusCount> = QuoteStatus::ALL
            .iter()
            .map(|s| StatusCount { status: *s, count: 0 })
            .collect();
        assert!(quotes_by_status_chart(&zeros).is_none());
    }

    #[test]
    fn test_barras_em_ordem_cronologica() {
        // Mais recente primeiro, como na análise mensal
        let data = [month("2026-10", 0.0, 0.0), month("2026-09", 1000.0, 400.0)];
        let img = revenue_vs_cost_chart(&data).unwrap();
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));

        // Primeiro grupo (setembro) tem a barra de faturamento
        let group = (WIDTH - 2 * MARGIN) / 2;
        let x = MARGIN + group / 2 - 5;
        assert_eq!(*img.get_pixel(x, HEIGHT - MARGIN - 10), PRIMARY);
        // Outubro zerado fica sem barras
        assert_eq!(*img.get_pixel(MARGIN + group + group / 2 - 5, HEIGHT - MARGIN - 10), BG);
    }

    #[test]
    fn test_pizza_comeca_no_topo() {
        let img = pie_chart("Despesas", &[("Aluguel".into(), 3.0), ("Transporte".into(), 1.0)]).unwrap();
        assert_eq!(img.dimensions(), (1100, 800));
        // À direita do topo: primeira fatia; à esquerda do topo: última
        assert_eq!(*img.get_pixel(410, 100), PALETTE[0]);
        assert_eq!(*img.get_pixel(390, 100), PALETTE[1]);
        assert_eq!(*img.get_pixel(5, 5), BG);
        // Quadrados da legenda com as cores das fatias
        assert_eq!(*img.get_pixel(805, MARGIN + 6), PALETTE[0]);
        assert_eq!(*img.get_pixel(805, MARGIN + 36), PALETTE[1]);
    }

    #[test]
    fn test_rotulos() {
        assert_eq!(month_label("2026-09"), "09/26");
        assert_eq!(month_label("set"), "set");
        assert_eq!(category_label("manutencao"), ExpenseCategory::Manutencao.label());
        assert_eq!(category_label("desconhecida"), "desconhecida");

        let data = [month("2026-09", 1000.0, 400.0)];
        let img = revenue_vs_cost_chart(&data).unwrap();
        let has_ink = |x0: u32, x1: u32, y0: u32, y1: u32| {
            (y0..y1).any(|y| (x0..x1).any(|x| *img.get_pixel(x, y) == TEXT))
        };
        // Título na margem superior e mês abaixo do eixo
        assert!(has_ink(MARGIN, MARGIN + 200, 15, 29));
        assert!(has_ink(MARGIN, WIDTH - MARGIN, HEIGHT - MARGIN + 10, HEIGHT - MARGIN + 24));
        // Legenda termina na borda direita da área de plotagem
        assert_eq!(*img.get_pixel(WIDTH - MARGIN - 1, 17), TEXT);
        assert_eq!(*img.get_pixel(WIDTH - MARGIN, 17), BG);
    }

    #[test]
    fn test_linha_com_lucro_negativo() {
        let data = [month("2026-02", 100.0, 300.0), month("2026-01", 500.0, 100.0)];
        assert!(profit_evolution_chart(&data).is_some());
    }

    #[test]
    fn test_salva_graficos() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::in_memory_with(AppConfig::in_dir(tmp.path())).unwrap();
        assert!(save_all_charts(&db).unwrap().is_empty());

        db.create_quote(&new_quote("Rita")).unwrap();
        let saved = save_all_charts(&db).unwrap();
        assert!(saved.contains_key("profit_vs_cost"));
        assert_eq!(build_charts(&db).unwrap().len(), saved.len());
        assert!(saved.contains_key("quotes_by_status"));
        assert!(!saved.contains_key("expenses_by_category"));
        assert!(saved["quotes_by_status"].exists());

        let img = quotes_by_status_chart(&db.quotes_by_status().unwrap()).unwrap();
        assert!(!chart_base64(&img).unwrap().is_empty());
    }
}
