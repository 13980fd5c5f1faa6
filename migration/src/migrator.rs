use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202601120001_create_users::Migration),
            Box::new(migrations::m202601120002_create_sites::Migration),
            Box::new(migrations::m202601120003_create_site_user_assignments::Migration),
            Box::new(migrations::m202601120004_create_attendance::Migration),
            Box::new(migrations::m202601120005_create_announcements::Migration),
        ]
    }
}
