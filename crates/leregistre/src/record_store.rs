// RecordStore implementation backed by SQLite

use lemoteur::{
    LearnerProfile, NewRecommendation, Program, RecommendationId, RecommendationStatus,
    RecordStore, StoreResult, Track, UserId,
};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::recommendations::{delete_record, insert_record, update_status};
use crate::schema::{grade_at, now, track_at, Storage};

fn load_profile(storage: &Storage, id: UserId) -> Result<LearnerProfile> {
    storage
        .conn()
        .query_row(
            "SELECT user_id, strand, gwa FROM users WHERE user_id = ?1",
            params![id],
            |row| {
                Ok(LearnerProfile {
                    id: row.get(0)?,
                    track: track_at(row, 1)?,
                    grade_average: grade_at(row, 2)?,
                })
            },
        )
        .optional()?
        .ok_or(StorageError::not_found("user", id))
}

fn load_programs(storage: &Storage, track: Track) -> Result<Vec<Program>> {
    let mut stmt = storage.conn().prepare_cached(
        "SELECT course_id, course_name, required_strand, minimum_gwa
         FROM courses WHERE required_strand = ?1 ORDER BY course_id",
    )?;
    let programs = stmt
        .query_map(params![track.as_str()], |row| {
            Ok(Program {
                id: row.get(0)?,
                name: row.get(1)?,
                required_track: track_at(row, 2)?,
                minimum_average: grade_at(row, 3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(programs)
}

impl RecordStore for Storage {
    fn fetch_profile(&self, id: UserId) -> StoreResult<LearnerProfile> {
        debug!("Fetching profile {}", id);
        Ok(load_profile(self, id)?)
    }

    fn fetch_programs_by_track(&self, track: Track) -> StoreResult<Vec<Program>> {
        debug!("Fetching programs for track {}", track);
        Ok(load_programs(self, track)?)
    }

    fn insert_recommendation(&mut self, record: &NewRecommendation) -> StoreResult<RecommendationId> {
        Ok(insert_record(self.conn(), record, now())?)
    }

    fn insert_recommendations(
        &mut self,
        records: &[NewRecommendation],
    ) -> StoreResult<Vec<RecommendationId>> {
        let timestamp = now();
        let tx = self.conn_mut().transaction().map_err(StorageError::from)?;

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            // Dropping the transaction on error rolls it back
            ids.push(insert_record(&tx, record, timestamp)?);
        }

        tx.commit().map_err(StorageError::from)?;
        debug!("Inserted {} recommendations", ids.len());
        Ok(ids)
    }

    fn update_recommendation_status(
        &mut self,
        id: RecommendationId,
        status: RecommendationStatus,
    ) -> StoreResult<()> {
        Ok(update_status(self.conn(), id, status)?)
    }

    fn delete_recommendation(&mut self, id: RecommendationId) -> StoreResult<()> {
        Ok(delete_record(self.conn(), id)?)
    }
}
