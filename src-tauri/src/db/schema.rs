use rusqlite::Connection;

pub fn create_tables(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        -- Configurações da empresa (linha única, id = 1)
        CREATE TABLE IF NOT EXISTS settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            company_name TEXT NOT NULL DEFAULT 'CalhaGest',
            company_phone TEXT NOT NULL DEFAULT '',
            company_email TEXT NOT NULL DEFAULT '',
            company_address TEXT NOT NULL DEFAULT '',
            company_cnpj TEXT NOT NULL DEFAULT '',
            company_logo BLOB,
            dobra_value REAL NOT NULL DEFAULT 5.0,
            backup_path TEXT,
            drive_folder_link TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        INSERT OR IGNORE INTO settings (id) VALUES (1);

        -- Tipos de produto (calha, rufo, pingadeira...)
        CREATE TABLE IF NOT EXISTS product_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT UNIQUE NOT NULL,
            label TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        -- Produtos
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT '',
            measure REAL NOT NULL DEFAULT 0,
            width REAL NOT NULL DEFAULT 0,
            length REAL NOT NULL DEFAULT 0,
            price_per_meter REAL NOT NULL DEFAULT 0,
            cost REAL NOT NULL DEFAULT 0,
            has_dobra INTEGER NOT NULL DEFAULT 0,
            pricing_unit TEXT NOT NULL DEFAULT 'metro' CHECK (pricing_unit IN ('metro', 'unidade')),
            is_installed INTEGER NOT NULL DEFAULT 1,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);
        CREATE INDEX IF NOT EXISTS idx_products_type ON products(type);

        -- Estoque
        CREATE TABLE IF NOT EXISTS inventory (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT '',
            quantity REAL NOT NULL DEFAULT 0,
            unit TEXT NOT NULL DEFAULT 'unidades',
            min_stock REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        -- Materiais consumidos por produto (baixa de estoque na aprovação)
        CREATE TABLE IF NOT EXISTS product_materials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER NOT NULL,
            inventory_id INTEGER NOT NULL,
            quantity_per_unit REAL NOT NULL DEFAULT 1,
            unit_type TEXT NOT NULL DEFAULT 'metro' CHECK (unit_type IN ('metro', 'cm', 'unidade')),
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            FOREIGN KEY (product_id) REFERENCES products(id) ON DELETE CASCADE,
            FOREIGN KEY (inventory_id) REFERENCES inventory(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_product_materials_product ON product_materials(product_id);

        -- Orçamentos
        CREATE TABLE IF NOT EXISTS quotes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_name TEXT NOT NULL,
            client_phone TEXT NOT NULL DEFAULT '',
            client_address TEXT NOT NULL DEFAULT '',
            total REAL NOT NULL DEFAULT 0,
            cost_total REAL NOT NULL DEFAULT 0,
            profit REAL NOT NULL DEFAULT 0,
            profitability REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'sent', 'approved', 'completed')),
            technical_notes TEXT NOT NULL DEFAULT '',
            contract_terms TEXT NOT NULL DEFAULT '',
            payment_methods TEXT NOT NULL DEFAULT '',
            scheduled_date TEXT,
            discount_total REAL NOT NULL DEFAULT 0,
            discount_type TEXT NOT NULL DEFAULT 'percentage' CHECK (discount_type IN ('percentage', 'value')),
            quote_type TEXT NOT NULL DEFAULT 'instalacao' CHECK (quote_type IN ('instalacao', 'fornecimento')),
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        CREATE INDEX IF NOT EXISTS idx_quotes_status ON quotes(status);
        CREATE INDEX IF NOT EXISTS idx_quotes_client ON quotes(client_name);

        -- Itens do orçamento (cópia dos dados do produto no momento da inclusão)
        CREATE TABLE IF NOT EXISTS quote_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            quote_id INTEGER NOT NULL,
            product_id INTEGER,
            product_name TEXT NOT NULL,
            measure REAL NOT NULL DEFAULT 0,
            width REAL NOT NULL DEFAULT 0,
            length REAL NOT NULL DEFAULT 0,
            pricing_unit TEXT NOT NULL DEFAULT 'metro',
            meters REAL NOT NULL DEFAULT 0,
            price_per_meter REAL NOT NULL DEFAULT 0,
            cost_per_meter REAL NOT NULL DEFAULT 0,
            discount REAL NOT NULL DEFAULT 0,
            total REAL NOT NULL DEFAULT 0,
            cost_total REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            FOREIGN KEY (quote_id) REFERENCES quotes(id) ON DELETE CASCADE,
            FOREIGN KEY (product_id) REFERENCES products(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_quote_items_quote ON quote_items(quote_id);

        -- Instalações agendadas
        CREATE TABLE IF NOT EXISTS installations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            quote_id INTEGER NOT NULL,
            client_name TEXT NOT NULL,
            address TEXT NOT NULL DEFAULT '',
            scheduled_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'in-progress', 'completed', 'cancelled')),
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            FOREIGN KEY (quote_id) REFERENCES quotes(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_installations_date ON installations(scheduled_date);

        -- Pagamentos recebidos por orçamento
        CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            quote_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            payment_method TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            payment_date TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            FOREIGN KEY (quote_id) REFERENCES quotes(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_payments_quote ON payments(quote_id);

        -- Despesas
        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'geral',
            amount REAL NOT NULL,
            expense_date TEXT NOT NULL DEFAULT (date('now', 'localtime')),
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(expense_date);

        -- Funcionários
        CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            salary REAL NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        -- Folha de pagamento
        CREATE TABLE IF NOT EXISTS payroll (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            reference_month TEXT NOT NULL,
            payment_date TEXT NOT NULL DEFAULT (date('now', 'localtime')),
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_payroll_month ON payroll(reference_month);
        ",
    )?;

    Ok(())
}

/// Tipos padrão quando a tabela está vazia
pub fn seed_product_types(conn: &Connection) -> Result<(), rusqlite::Error> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM product_types", [], |row| row.get(0))?;

    if count == 0 {
        for (key, label) in [("calha", "Calha"), ("rufo", "Rufo"), ("pingadeira", "Pingadeira")] {
            conn.execute(
                "INSERT INTO product_types (key, label) VALUES (?1, ?2)",
                rusqlite::params![key, label],
            )?;
        }
    }

    Ok(())
}
