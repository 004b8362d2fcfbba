use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    entities::purchase_lot::{self, Entity as PurchaseLotEntity},
    errors::ServiceError,
};

/// How much was drawn from one lot during a consumption pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LotDraw {
    pub lot_id: Uuid,
    pub quantity: Decimal,
    pub vendor_name: Option<String>,
    pub po_number: Option<String>,
}

/// FIFO lot consumption and restoration for received purchase lots.
///
/// Lots are always walked in ascending `received_at` order (lot id as the
/// tie-break so the order is total). Restoration walks the same order and
/// caps each lot at its original quantity: it approximately inverts FIFO
/// consumption but is not a per-consumption ledger — if other builds drew
/// from the same lots in between, the restored lots may differ from the
/// consumed ones.
///
/// Like the stock ledger, every operation runs on the caller's connection
/// and therefore inside the caller's transaction.
pub struct LotTracker;

impl LotTracker {
    /// Locks the lot rows (`FOR UPDATE` where the backend supports it) so two
    /// transactions consuming the same item serialize on its lots.
    async fn received_lots_fifo<C: ConnectionTrait>(
        conn: &C,
        item_id: Uuid,
    ) -> Result<Vec<purchase_lot::Model>, ServiceError> {
        PurchaseLotEntity::find()
            .filter(purchase_lot::Column::InventoryItemId.eq(item_id))
            .filter(purchase_lot::Column::Received.eq(true))
            .order_by_asc(purchase_lot::Column::ReceivedAt)
            .order_by_asc(purchase_lot::Column::Id)
            .lock_exclusive()
            .all(conn)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Consumes `quantity` from the oldest received lots first.
    ///
    /// Fails with `InsufficientLots` (and performs no update) when the total
    /// remaining quantity across lots cannot cover the request. Lot totals
    /// reconcile against the stock ledger but are validated independently.
    pub async fn consume<C: ConnectionTrait>(
        conn: &C,
        item_id: Uuid,
        quantity: Decimal,
    ) -> Result<Vec<LotDraw>, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Lot consumption quantity must be positive, got: {}",
                quantity
            )));
        }

        let lots = Self::received_lots_fifo(conn, item_id).await?;
        let draws = plan_consumption(&lots, quantity).ok_or_else(|| {
            let available: Decimal = lots.iter().map(|l| l.remaining_quantity).sum();
            ServiceError::InsufficientLots(format!(
                "Item {} has {} remaining across {} lot(s), requested {}",
                item_id,
                available,
                lots.len(),
                quantity
            ))
        })?;

        for draw in &draws {
            let lot = lots
                .iter()
                .find(|l| l.id == draw.lot_id)
                .cloned()
                .ok_or_else(|| ServiceError::InternalError("Planned lot vanished".to_string()))?;

            debug!(lot_id = %lot.id, drawn = %draw.quantity, "Consuming from lot");

            let remaining = lot.remaining_quantity - draw.quantity;
            let mut active: purchase_lot::ActiveModel = lot.into();
            active.remaining_quantity = Set(remaining);
            active.updated_at = Set(Utc::now());
            active.update(conn).await.map_err(ServiceError::db_error)?;
        }

        Ok(draws)
    }

    /// Restores `quantity` to the oldest received lots first, capping each
    /// lot at its original quantity.
    pub async fn restore<C: ConnectionTrait>(
        conn: &C,
        item_id: Uuid,
        quantity: Decimal,
    ) -> Result<Vec<LotDraw>, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Lot restoration quantity must be positive, got: {}",
                quantity
            )));
        }

        let lots = Self::received_lots_fifo(conn, item_id).await?;
        let restores = plan_restoration(&lots, quantity).ok_or_else(|| {
            let consumed: Decimal = lots.iter().map(|l| l.consumed_quantity()).sum();
            ServiceError::InsufficientLots(format!(
                "Item {} has only {} consumed across its lots, cannot restore {}",
                item_id, consumed, quantity
            ))
        })?;

        for restore in &restores {
            let lot = lots
                .iter()
                .find(|l| l.id == restore.lot_id)
                .cloned()
                .ok_or_else(|| ServiceError::InternalError("Planned lot vanished".to_string()))?;

            debug!(lot_id = %lot.id, restored = %restore.quantity, "Restoring to lot");

            let remaining = lot.remaining_quantity + restore.quantity;
            let mut active: purchase_lot::ActiveModel = lot.into();
            active.remaining_quantity = Set(remaining);
            active.updated_at = Set(Utc::now());
            active.update(conn).await.map_err(ServiceError::db_error)?;
        }

        Ok(restores)
    }
}

/// Plans a FIFO consumption pass over lots already sorted oldest-first.
/// Returns `None` when the lots cannot cover `quantity`.
fn plan_consumption(lots: &[purchase_lot::Model], quantity: Decimal) -> Option<Vec<LotDraw>> {
    let mut still_needed = quantity;
    let mut draws = Vec::new();

    for lot in lots {
        if still_needed == Decimal::ZERO {
            break;
        }
        if lot.remaining_quantity <= Decimal::ZERO {
            continue;
        }

        let drawn = lot.remaining_quantity.min(still_needed);
        still_needed -= drawn;
        draws.push(LotDraw {
            lot_id: lot.id,
            quantity: drawn,
            vendor_name: lot.vendor_name.clone(),
            po_number: lot.po_number.clone(),
        });
    }

    (still_needed == Decimal::ZERO).then_some(draws)
}

/// Plans a FIFO restoration pass: oldest lots first, each capped at
/// `quantity - remaining_quantity` so a lot never exceeds what it originally
/// received. Returns `None` when the recorded consumption cannot absorb
/// `quantity`.
fn plan_restoration(lots: &[purchase_lot::Model], quantity: Decimal) -> Option<Vec<LotDraw>> {
    let mut still_to_restore = quantity;
    let mut restores = Vec::new();

    for lot in lots {
        if still_to_restore == Decimal::ZERO {
            break;
        }

        let restorable = lot.consumed_quantity();
        if restorable <= Decimal::ZERO {
            continue;
        }

        let restored = restorable.min(still_to_restore);
        still_to_restore -= restored;
        restores.push(LotDraw {
            lot_id: lot.id,
            quantity: restored,
            vendor_name: lot.vendor_name.clone(),
            po_number: lot.po_number.clone(),
        });
    }

    (still_to_restore == Decimal::ZERO).then_some(restores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn lot(offset_secs: i64, quantity: Decimal, remaining: Decimal) -> purchase_lot::Model {
        let now = Utc::now();
        purchase_lot::Model {
            id: Uuid::new_v4(),
            inventory_item_id: Uuid::new_v4(),
            quantity,
            remaining_quantity: remaining,
            received: true,
            received_at: Some(now + Duration::seconds(offset_secs)),
            po_number: None,
            vendor_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn consumption_drains_oldest_lot_first() {
        // Lots arrive pre-sorted oldest-first, as the query guarantees.
        let lots = vec![lot(0, dec!(5), dec!(5)), lot(60, dec!(10), dec!(10))];

        let draws = plan_consumption(&lots, dec!(8)).unwrap();

        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].lot_id, lots[0].id);
        assert_eq!(draws[0].quantity, dec!(5));
        assert_eq!(draws[1].lot_id, lots[1].id);
        assert_eq!(draws[1].quantity, dec!(3));
    }

    #[test]
    fn consumption_skips_exhausted_lots() {
        let lots = vec![lot(0, dec!(5), dec!(0)), lot(60, dec!(10), dec!(10))];

        let draws = plan_consumption(&lots, dec!(4)).unwrap();

        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].lot_id, lots[1].id);
        assert_eq!(draws[0].quantity, dec!(4));
    }

    #[test]
    fn consumption_fails_when_lots_cannot_cover_request() {
        let lots = vec![lot(0, dec!(5), dec!(2)), lot(60, dec!(10), dec!(1))];

        assert!(plan_consumption(&lots, dec!(4)).is_none());
    }

    #[test]
    fn restoration_fills_oldest_lot_first_capped_at_original() {
        // Lot 1 fully consumed, lot 2 partially.
        let lots = vec![lot(0, dec!(5), dec!(0)), lot(60, dec!(10), dec!(7))];

        let restores = plan_restoration(&lots, dec!(8)).unwrap();

        assert_eq!(restores.len(), 2);
        assert_eq!(restores[0].lot_id, lots[0].id);
        assert_eq!(restores[0].quantity, dec!(5));
        assert_eq!(restores[1].lot_id, lots[1].id);
        assert_eq!(restores[1].quantity, dec!(3));
    }

    #[test]
    fn restoration_never_exceeds_recorded_consumption() {
        let lots = vec![lot(0, dec!(5), dec!(4))];

        assert!(plan_restoration(&lots, dec!(2)).is_none());
        assert!(plan_restoration(&lots, dec!(1)).is_some());
    }
}
