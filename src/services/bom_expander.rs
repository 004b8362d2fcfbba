use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{entities::bom_component, errors::ServiceError};

/// One component requirement computed for a build.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRequirement {
    pub component_item_id: Uuid,
    pub quantity_per_unit: Decimal,
    pub required: Decimal,
}

/// Expands a BOM component list into per-component required quantities for a
/// build of `build_quantity` units.
///
/// Pure and deterministic: no I/O, no clock. The assembly engine calls this
/// first and everything downstream works off the returned requirements.
pub fn expand(
    components: &[bom_component::Model],
    build_quantity: i32,
) -> Result<Vec<ComponentRequirement>, ServiceError> {
    if build_quantity <= 0 {
        return Err(ServiceError::InvalidInput(format!(
            "Build quantity must be positive, got: {}",
            build_quantity
        )));
    }

    if components.is_empty() {
        return Err(ServiceError::InvalidOperation(
            "BOM has no components".to_string(),
        ));
    }

    let factor = Decimal::from(build_quantity);
    Ok(components
        .iter()
        .map(|component| ComponentRequirement {
            component_item_id: component.component_item_id,
            quantity_per_unit: component.quantity_per_unit,
            required: component.quantity_per_unit * factor,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn component(quantity_per_unit: Decimal) -> bom_component::Model {
        bom_component::Model {
            id: Uuid::new_v4(),
            bom_id: Uuid::new_v4(),
            component_item_id: Uuid::new_v4(),
            quantity_per_unit,
            position: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn multiplies_each_component_by_build_quantity() {
        let components = vec![component(dec!(2)), component(dec!(0.5))];

        let requirements = expand(&components, 3).unwrap();

        assert_eq!(requirements.len(), 2);
        assert_eq!(requirements[0].required, dec!(6));
        assert_eq!(requirements[1].required, dec!(1.5));
        assert_eq!(
            requirements[0].component_item_id,
            components[0].component_item_id
        );
    }

    #[test]
    fn rejects_zero_and_negative_quantities() {
        let components = vec![component(dec!(1))];

        assert!(matches!(
            expand(&components, 0),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            expand(&components, -4),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_empty_bom() {
        assert!(matches!(
            expand(&[], 1),
            Err(ServiceError::InvalidOperation(_))
        ));
    }
}
