pub use sea_orm_migration::prelude::*;

mod m20250901_000001_add_lucky_draw;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250901_000001_add_lucky_draw::Migration)]
    }
}
