use comfy_table::{Cell, Table};

use paytrail::db::{get_categories, get_connection, init_db};
use paytrail::error::Result;
use paytrail::settings::load_settings;

pub fn list() -> Result<()> {
    let settings = load_settings();
    std::fs::create_dir_all(&settings.data_dir)?;
    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type"]);
    for cat in get_categories(&conn)? {
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(cat.category_type.key()),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}
