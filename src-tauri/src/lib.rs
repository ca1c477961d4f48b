pub mod backup;
pub mod charts;
pub mod config;
pub mod db;
pub mod drive;
pub mod error;
pub mod export;
pub mod models;
pub mod pdf;
pub mod pricing;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::AppConfig::from_env();
    let database = db::Database::new(config).expect("Erro ao inicializar o banco de dados");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(database)
        .invoke_handler(tauri::generate_handler![
            // Produtos
            commands::products::create_product,
            commands::products::list_products,
            commands::products::get_product,
            commands::products::update_product,
            commands::products::delete_product,
            commands::products::list_product_types,
            commands::products::create_product_type,
            commands::products::delete_product_type,
            commands::products::list_product_materials,
            commands::products::add_product_material,
            commands::products::remove_product_material,
            // Orçamentos
            commands::quotes::create_quote,
            commands::quotes::list_quotes,
            commands::quotes::get_quote,
            commands::quotes::update_quote,
            commands::quotes::set_quote_discount,
            commands::quotes::update_quote_status,
            commands::quotes::approve_quote,
            commands::quotes::advance_quote_status,
            commands::quotes::delete_quote,
            commands::quotes::recalculate_quote_totals,
            commands::quotes::add_quote_item,
            commands::quotes::update_quote_item,
            commands::quotes::remove_quote_item,
            commands::quotes::deduct_stock_for_quote,
            commands::quotes::generate_quote_pdf,
            // Estoque
            commands::inventory::create_inventory_item,
            commands::inventory::list_inventory,
            commands::inventory::get_inventory_item,
            commands::inventory::list_low_stock,
            commands::inventory::update_inventory_quantity,
            commands::inventory::update_inventory_item,
            commands::inventory::delete_inventory_item,
            // Instalações
            commands::installations::create_installation,
            commands::installations::list_installations,
            commands::installations::update_installation_status,
            commands::installations::delete_installation,
            // Financeiro
            commands::finance::add_payment,
            commands::finance::list_payments,
            commands::finance::delete_payment,
            commands::finance::get_payment_summary,
            commands::finance::get_all_payment_summaries,
            commands::finance::create_expense,
            commands::finance::update_expense,
            commands::finance::list_expenses,
            commands::finance::delete_expense,
            commands::finance::get_expenses_summary,
            commands::finance::create_employee,
            commands::finance::update_employee,
            commands::finance::list_employees,
            commands::finance::delete_employee,
            commands::finance::add_payroll,
            commands::finance::list_payroll,
            commands::finance::delete_payroll,
            commands::finance::get_payroll_summary,
            // Configurações
            commands::settings::get_settings,
            commands::settings::update_settings,
            commands::settings::get_dobra_value,
            commands::settings::load_company_logo,
            commands::settings::get_company_logo,
            commands::settings::remove_company_logo,
            // Backup
            commands::backup::get_backup_dir,
            commands::backup::set_backup_dir,
            commands::backup::save_backup,
            commands::backup::export_all_data,
            commands::backup::restore_backup,
            commands::backup::upload_backup_to_drive,
            commands::backup::test_drive_connection,
            // Relatórios
            commands::reports::get_dashboard_stats,
            commands::reports::get_monthly_analytics,
            commands::reports::get_quotes_by_status,
            commands::reports::generate_charts,
            commands::reports::get_chart_images,
            commands::reports::export_quotes_csv,
            commands::reports::export_expenses_csv,
            commands::reports::export_inventory_csv,
        ])
        .run(tauri::generate_context!())
        .expect("Erro ao executar a aplicação");
}
