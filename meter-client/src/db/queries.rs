use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::domain::{IntervalReading, NewIntervalReading, NewReadingType, ReadingType};

/// Postgres caps bind parameters per statement at 65535; each reading binds four.
const INSERT_CHUNK_ROWS: usize = 10_000;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reading_type (
    id              BIGSERIAL PRIMARY KEY,
    meter_id        TEXT    NOT NULL UNIQUE,
    flow_direction  INTEGER NOT NULL,
    kwh_price       NUMERIC NOT NULL CHECK (kwh_price >= 0),
    reading_unit    TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS interval_reading (
    id                BIGSERIAL PRIMARY KEY,
    reading_type_id   BIGINT NOT NULL REFERENCES reading_type (id),
    start_timestamp   BIGINT NOT NULL,
    duration_seconds  BIGINT NOT NULL CHECK (duration_seconds > 0),
    reading_value     BIGINT NOT NULL CHECK (reading_value >= 0)
);

CREATE INDEX IF NOT EXISTS interval_reading_reading_type_idx
    ON interval_reading (reading_type_id);
"#;

/// Create both tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await.map(|_| ())
}

pub async fn find_reading_type_by_meter_id<'e, E>(
    executor: E,
    meter_id: &str,
) -> Result<Option<ReadingType>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ReadingType>(
        r#"
        SELECT id, meter_id, flow_direction, kwh_price, reading_unit
        FROM reading_type
        WHERE meter_id = $1
        "#,
    )
    .bind(meter_id)
    .fetch_optional(executor)
    .await
}

/// Insert a reading type unless the meter already has one.
///
/// Returns `None` when another writer owns the meter id; the caller decides
/// whether that is a conflict.
pub async fn insert_reading_type_if_absent<'e, E>(
    executor: E,
    record: &NewReadingType,
) -> Result<Option<ReadingType>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ReadingType>(
        r#"
        INSERT INTO reading_type (meter_id, flow_direction, kwh_price, reading_unit)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (meter_id) DO NOTHING
        RETURNING id, meter_id, flow_direction, kwh_price, reading_unit
        "#,
    )
    .bind(&record.meter_id)
    .bind(record.flow_direction)
    .bind(record.kwh_price)
    .bind(&record.reading_unit)
    .fetch_optional(executor)
    .await
}

pub async fn all_reading_types<'e, E>(executor: E) -> Result<Vec<ReadingType>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ReadingType>(
        r#"
        SELECT id, meter_id, flow_direction, kwh_price, reading_unit
        FROM reading_type
        ORDER BY meter_id
        "#,
    )
    .fetch_all(executor)
    .await
}

/// All stored interval readings of one meter, in start order.
pub async fn readings_by_meter_id<'e, E>(
    executor: E,
    meter_id: &str,
) -> Result<Vec<IntervalReading>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, IntervalReading>(
        r#"
        SELECT
            ir.id,
            ir.reading_type_id,
            ir.start_timestamp,
            ir.duration_seconds,
            ir.reading_value
        FROM interval_reading ir
        JOIN reading_type rt ON ir.reading_type_id = rt.id
        WHERE rt.meter_id = $1
        ORDER BY ir.start_timestamp, ir.id
        "#,
    )
    .bind(meter_id)
    .fetch_all(executor)
    .await
}

/// Multi-row insert of interval readings, split so no statement exceeds the
/// bind parameter limit. Returns the number of rows written.
pub async fn insert_readings(
    conn: &mut PgConnection,
    readings: &[NewIntervalReading],
) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;

    for chunk in readings.chunks(INSERT_CHUNK_ROWS) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO interval_reading (reading_type_id, start_timestamp, duration_seconds, reading_value) ",
        );

        builder.push_values(chunk, |mut b, r| {
            b.push_bind(r.reading_type_id)
                .push_bind(r.start_timestamp)
                .push_bind(r.duration_seconds)
                .push_bind(r.reading_value);
        });

        let result = builder.build().execute(&mut *conn).await?;
        inserted += result.rows_affected();
    }

    Ok(inserted)
}
