#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use filtercrate::{EntitySchema, Schema};
use sea_orm::{ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait};
use sea_orm::sea_query::SelectStatement;
use sea_orm_migration::prelude::*;

pub mod artist_entity;
pub mod performance_entity;
pub mod recording_entity;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;
    seed(&db).await?;

    Ok(db)
}

/// Filter metadata for the concert tables.
pub fn concert_schema() -> Schema {
    Schema::new()
        .register(EntitySchema::from_entity::<artist_entity::Entity>().has_many(
            "performances",
            "performance",
            "id",
            "artist_id",
        ))
        .register(
            EntitySchema::from_entity::<performance_entity::Entity>()
                .belongs_to("artist", "artist", "artist_id", "id")
                .has_many("recordings", "recording", "id", "performance_id"),
        )
        .register(
            EntitySchema::from_entity::<recording_entity::Entity>().belongs_to(
                "performance",
                "performance",
                "performance_id",
                "id",
            ),
        )
}

/// Run a built select and load the root entity's models.
pub async fn fetch<E: EntityTrait>(db: &DatabaseConnection, select: &SelectStatement) -> Vec<E::Model> {
    let statement = db.get_database_backend().build(select);
    E::find()
        .from_raw_sql(statement)
        .all(db)
        .await
        .expect("Failed to run filtered query")
}

pub fn date(value: &str) -> NaiveDateTime {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .expect("valid fixture date")
        .and_hms_opt(0, 0, 0)
        .expect("midnight")
}

async fn seed(db: &DatabaseConnection) -> Result<(), DbErr> {
    let artists = [(1, "Grateful Dead"), (2, "Phish"), (3, "String Cheese Incident")];
    artist_entity::Entity::insert_many(artists.map(|(id, name)| artist_entity::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
    }))
    .exec(db)
    .await?;

    let performances = [
        (1, 1, "1995-02-21", Some("Delta Center"), "Salt Lake City", "Utah"),
        (2, 1, "1969-11-08", Some("Fillmore Auditorium"), "San Francisco", "California"),
        (3, 1, "1977-05-08", Some("Barton Hall, Cornell University"), "Ithaca", "New York"),
        (4, 1, "1995-07-09", Some("Soldier Field"), "Chicago", "Illinois"),
        (5, 2, "1998-11-02", Some("E Center"), "West Valley City", "Utah"),
        (6, 2, "1999-12-31", None, "Big Cypress", "Florida"),
        (7, 3, "2002-06-21", Some("Bonnaroo"), "Manchester", "Tennessee"),
    ];
    performance_entity::Entity::insert_many(performances.map(|(id, artist_id, day, venue, city, state)| {
        performance_entity::ActiveModel {
            id: Set(id),
            artist_id: Set(artist_id),
            performance_date: Set(date(day)),
            venue: Set(venue.map(str::to_string)),
            city: Set(city.to_string()),
            state: Set(state.to_string()),
        }
    }))
    .exec(db)
    .await?;

    let recordings = [(1, "SBD", 1), (2, "AUD", 1), (3, "SBD", 5)];
    recording_entity::Entity::insert_many(recordings.map(|(id, source, performance_id)| {
        recording_entity::ActiveModel {
            id: Set(id),
            source: Set(source.to_string()),
            performance_id: Set(performance_id),
        }
    }))
    .exec(db)
    .await?;

    Ok(())
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateConcertTables)]
    }
}

pub struct CreateConcertTables;

impl MigrationName for CreateConcertTables {
    fn name(&self) -> &str {
        "m20240101_000001_create_concert_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateConcertTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = sea_orm::Schema::new(manager.get_database_backend());
        manager
            .create_table(schema.create_table_from_entity(artist_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(performance_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(recording_entity::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(recording_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(performance_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(artist_entity::Entity).to_owned())
            .await
    }
}
