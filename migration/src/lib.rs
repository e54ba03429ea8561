pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_questions;
mod m20250610_000002_add_nanno_jikan_dayo_clicks;
mod m20250620_000003_add_admin_conclusion;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_questions::Migration),
            Box::new(m20250610_000002_add_nanno_jikan_dayo_clicks::Migration),
            Box::new(m20250620_000003_add_admin_conclusion::Migration),
        ]
    }
}
