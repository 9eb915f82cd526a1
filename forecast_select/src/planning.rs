//! Planning helpers driven by a demand forecast

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Economic order quantity for the whole forecast horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSizing {
    pub economic_order_quantity: f64,
    pub total_demand: f64,
    pub average_demand: f64,
    pub ordering_cost: f64,
    pub holding_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionSchedule {
    /// Per-period output, demand capped at capacity
    pub production_schedule: Vec<f64>,
    /// Percentage of available capacity used
    pub capacity_utilization: f64,
    pub total_production: f64,
    pub capacity: f64,
    /// Demand above capacity that the schedule leaves uncovered
    pub unmet_demand: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialsPlan {
    /// Production plus safety stock for each period
    pub materials_schedule: Vec<f64>,
    /// Materials schedule delayed by the lead time, zero while waiting
    pub order_schedule: Vec<f64>,
    pub total_materials: f64,
    pub lead_time_days: usize,
    pub safety_stock: f64,
}

fn check_demand(demand: &[f64], what: &str) -> Result<()> {
    if demand.is_empty() {
        return Err(ForecastError::InvalidParameter(format!("{} is empty", what)));
    }
    if demand.iter().any(|d| !d.is_finite() || *d < 0.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "{} must contain finite, non-negative values",
            what
        )));
    }
    Ok(())
}

/// `EOQ = sqrt(2 * D * S / H)` with `D` the total forecast demand
pub fn lot_sizing(demand: &[f64], ordering_cost: f64, holding_cost: f64) -> Result<LotSizing> {
    check_demand(demand, "demand forecast")?;
    if !(holding_cost > 0.0) || !(ordering_cost >= 0.0) {
        return Err(ForecastError::InvalidParameter(
            "holding cost must be positive and ordering cost non-negative".to_string(),
        ));
    }

    let total_demand: f64 = demand.iter().sum();
    Ok(LotSizing {
        economic_order_quantity: (2.0 * total_demand * ordering_cost / holding_cost).sqrt(),
        total_demand,
        average_demand: total_demand / demand.len() as f64,
        ordering_cost,
        holding_cost,
    })
}

pub fn production_schedule(demand: &[f64], capacity: f64) -> Result<ProductionSchedule> {
    check_demand(demand, "demand forecast")?;
    if !(capacity > 0.0) || !capacity.is_finite() {
        return Err(ForecastError::InvalidParameter(
            "capacity must be a positive number".to_string(),
        ));
    }

    let schedule: Vec<f64> = demand.iter().map(|d| d.min(capacity)).collect();
    let total_production: f64 = schedule.iter().sum();
    let total_demand: f64 = demand.iter().sum();

    Ok(ProductionSchedule {
        capacity_utilization: total_production / (capacity * schedule.len() as f64) * 100.0,
        total_production,
        capacity,
        unmet_demand: total_demand - total_production,
        production_schedule: schedule,
    })
}

pub fn materials_plan(production: &[f64], lead_time: usize, safety_stock: f64) -> Result<MaterialsPlan> {
    check_demand(production, "production schedule")?;
    if !(safety_stock >= 0.0) || !safety_stock.is_finite() {
        return Err(ForecastError::InvalidParameter(
            "safety stock must be a non-negative number".to_string(),
        ));
    }

    let materials: Vec<f64> = production.iter().map(|p| p + safety_stock).collect();
    let delay = lead_time.min(materials.len());
    let order_schedule: Vec<f64> = std::iter::repeat(0.0)
        .take(delay)
        .chain(materials.iter().copied().take(materials.len() - delay))
        .collect();

    Ok(MaterialsPlan {
        total_materials: materials.iter().sum(),
        materials_schedule: materials,
        order_schedule,
        lead_time_days: lead_time,
        safety_stock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn eoq_matches_the_formula() {
        let lots = lot_sizing(&[100.0, 300.0], 100.0, 2.0).unwrap();
        assert_relative_eq!(lots.economic_order_quantity, 200.0);
        assert_relative_eq!(lots.average_demand, 200.0);
        assert!(lot_sizing(&[1.0], 1.0, 0.0).is_err());
        assert!(lot_sizing(&[], 1.0, 1.0).is_err());
    }

    #[test]
    fn schedule_is_capped_by_capacity() {
        let plan = production_schedule(&[500.0, 1500.0], 1000.0).unwrap();
        assert_eq!(plan.production_schedule, vec![500.0, 1000.0]);
        assert_relative_eq!(plan.capacity_utilization, 75.0);
        assert_relative_eq!(plan.unmet_demand, 500.0);
    }

    #[test]
    fn orders_are_shifted_by_lead_time() {
        let plan = materials_plan(&[10.0, 20.0, 30.0], 2, 5.0).unwrap();
        assert_eq!(plan.materials_schedule, vec![15.0, 25.0, 35.0]);
        assert_eq!(plan.order_schedule, vec![0.0, 0.0, 15.0]);
        assert_relative_eq!(plan.total_materials, 75.0);

        let long = materials_plan(&[10.0], 7, 0.0).unwrap();
        assert_eq!(long.order_schedule, vec![0.0]);
    }
}
