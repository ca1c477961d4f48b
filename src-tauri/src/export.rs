use crate::db::Database;
use crate::error::AppResult;
use std::io::Write;
use std::path::Path;

/// BOM UTF-8 para o Excel reconhecer os acentos
const BOM: &[u8] = b"\xEF\xBB\xBF";
/// Ponto e vírgula, padrão do Excel em português
const SEP: &str = ";";

fn escape_csv(value: &str) -> String {
    if value.contains(';') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Decimal com vírgula
fn decimal(value: f64) -> String {
    format!("{:.2}", value).replace('.', ",")
}

fn write_csv(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(BOM)?;
    writeln!(file, "{}", headers.join(SEP))?;

    for row in rows {
        let line: Vec<String> = row.iter().map(|v| escape_csv(v)).collect();
        writeln!(file, "{}", line.join(SEP))?;
    }
    Ok(())
}

pub fn export_quotes_csv(db: &Database, path: &Path) -> AppResult<String> {
    let quotes = db.list_quotes("", None)?;
    let rows: Vec<Vec<String>> = quotes
        .iter()
        .map(|q| {
            vec![
                q.id.unwrap_or_default().to_string(),
                q.created_at.clone().unwrap_or_default(),
                q.client_name.clone(),
                q.client_phone.clone(),
                q.client_address.clone(),
                q.status.label().to_string(),
                decimal(q.total),
                decimal(q.cost_total),
                decimal(q.profit),
                format!("{:.1}%", q.profitability).replace('.', ","),
            ]
        })
        .collect();

    let headers = [
        "Número", "Data", "Cliente", "Telefone", "Endereço", "Status", "Total", "Custo", "Lucro", "Rentabilidade",
    ];
    write_csv(path, &headers, &rows)?;
    Ok(format!("{} orçamentos exportados", rows.len()))
}

pub fn export_expenses_csv(db: &Database, path: &Path) -> AppResult<String> {
    let expenses = db.list_expenses("", None)?;
    let rows: Vec<Vec<String>> = expenses
        .iter()
        .map(|e| {
            vec![
                e.expense_date.clone().unwrap_or_default(),
                e.description.clone(),
                e.category.label().to_string(),
                decimal(e.amount),
                e.notes.clone(),
            ]
        })
        .collect();

    let headers = ["Data", "Descrição", "Categoria", "Valor", "Observações"];
    write_csv(path, &headers, &rows)?;
    Ok(format!("{} despesas exportadas", rows.len()))
}

pub fn export_inventory_csv(db: &Database, path: &Path) -> AppResult<String> {
    let items = db.list_inventory("", "")?;
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|i| {
            vec![
                i.name.clone(),
                i.item_type.clone(),
                decimal(i.quantity),
                i.unit.clone(),
                decimal(i.min_stock),
                if i.is_low() { "Sim" } else { "Não" }.to_string(),
            ]
        })
        .collect();

    let headers = ["Nome", "Tipo", "Quantidade", "Unidade", "Estoque mínimo", "Estoque baixo"];
    write_csv(path, &headers, &rows)?;
    Ok(format!("{} itens exportados", rows.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::inventory::tests::stock_item;
    use crate::db::quotes::tests::new_quote;

    fn read(path: &Path) -> String {
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.starts_with(BOM));
        String::from_utf8(bytes[BOM.len()..].to_vec()).unwrap()
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_csv("simples"), "simples");
        assert_eq!(escape_csv("a;b"), "\"a;b\"");
        assert_eq!(escape_csv("calha \"moldura\""), "\"calha \"\"moldura\"\"\"");
        assert_eq!(decimal(1234.5), "1234,50");
    }

    #[test]
    fn test_exporta_orcamentos() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let mut quote = new_quote("João; filho");
        quote.client_phone = "(11) 99999-0000".into();
        db.create_quote(&quote).unwrap();

        let path = tmp.path().join("orcamentos.csv");
        let msg = export_quotes_csv(&db, &path).unwrap();
        assert_eq!(msg, "1 orçamentos exportados");

        let content = read(&path);
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Número;Data;Cliente"));
        assert!(lines[1].contains("\"João; filho\""));
        assert!(lines[1].contains("Rascunho"));
    }

    #[test]
    fn test_exporta_estoque_em_subpasta() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        db.create_inventory_item(&stock_item("Chapa 0,5mm", 2.0, 10.0)).unwrap();

        let path = tmp.path().join("relatorios").join("estoque.csv");
        export_inventory_csv(&db, &path).unwrap();
        let content = read(&path);
        assert!(content.lines().nth(1).unwrap().ends_with("2,00;metros;10,00;Sim"));

        let path = tmp.path().join("despesas.csv");
        assert_eq!(export_expenses_csv(&db, &path).unwrap(), "0 despesas exportadas");
    }
}
