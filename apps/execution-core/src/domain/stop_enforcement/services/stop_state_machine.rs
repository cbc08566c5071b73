//! Position Stop State Machine
//!
//! Pure evaluation of one price tick against one position snapshot. The
//! caller persists the resulting trailing update and decides whether a
//! trigger is new.

use rust_decimal::Decimal;

use crate::domain::shared::Timestamp;
use crate::domain::stop_enforcement::value_objects::{
    DrawdownTrigger, PositionDirection, PositionSnapshot, StopLossTrigger, StopLossType, Trigger,
};

/// Change to a position's trailing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingUpdate {
    /// Profit reached the activation threshold; the tick price is the first
    /// peak.
    Activated {
        /// Initial peak.
        peak: Decimal,
    },
    /// Price improved on the recorded peak.
    PeakAdvanced {
        /// New peak.
        peak: Decimal,
    },
}

impl TrailingUpdate {
    /// The peak after this update.
    #[must_use]
    pub const fn peak(&self) -> Decimal {
        match self {
            Self::Activated { peak } | Self::PeakAdvanced { peak } => *peak,
        }
    }
}

/// Result of evaluating one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Trailing state to persist, if it changed.
    pub trailing: Option<TrailingUpdate>,
    /// Exit trigger, if any.
    pub trigger: Option<Trigger>,
}

/// Stateless stop rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopStateMachine;

impl StopStateMachine {
    /// Evaluate `price` against `position`.
    ///
    /// Before activation only the hard stop and the activation threshold are
    /// checked. Once activated the peak is advanced first, then a drawdown at
    /// or beyond the pullback ratio wins over a hard-stop breach.
    #[must_use]
    pub fn evaluate(position: &PositionSnapshot, price: Decimal, at: Timestamp) -> Evaluation {
        if !position.is_active() {
            return Evaluation::default();
        }

        if !position.trailing_activated {
            if position.direction.breaches(price, position.stop_loss) {
                return Evaluation {
                    trailing: None,
                    trigger: Some(Self::stop_loss_trigger(position, price, at)),
                };
            }
            if position.profit_points(price) >= position.trailing_activation_points {
                return Evaluation {
                    trailing: Some(TrailingUpdate::Activated { peak: price }),
                    trigger: None,
                };
            }
            return Evaluation::default();
        }

        let previous_peak = position.peak_price.unwrap_or(price);
        let peak = position.direction.better(previous_peak, price);
        let trailing = (position.peak_price != Some(peak))
            .then_some(TrailingUpdate::PeakAdvanced { peak });

        if let Some(ratio) = Self::drawdown_ratio(peak, price)
            && ratio >= position.trailing_pullback_ratio
        {
            return Evaluation {
                trailing,
                trigger: Some(Trigger::Drawdown(DrawdownTrigger {
                    position_id: position.id.clone(),
                    group_id: position.group_id.clone(),
                    price,
                    peak_price: peak,
                    drawdown_ratio: ratio,
                    triggered_at: at,
                })),
            };
        }

        let trigger = position
            .direction
            .breaches(price, position.stop_loss)
            .then(|| Self::stop_loss_trigger(position, price, at));
        Evaluation { trailing, trigger }
    }

    /// Apply a trailing update to a snapshot the way the stop service
    /// persists it: the peak never regresses, and only activation changes
    /// the stop type.
    pub fn apply(position: &mut PositionSnapshot, update: TrailingUpdate) {
        let direction = position.direction;
        position.peak_price = Some(
            position
                .peak_price
                .map_or(update.peak(), |stored| direction.better(stored, update.peak())),
        );
        if let TrailingUpdate::Activated { .. } = update {
            position.trailing_activated = true;
            position.is_initial_stop = false;
            if position.stop_type.can_transition_to(StopLossType::Trailing) {
                position.stop_type = StopLossType::Trailing;
            }
        }
    }

    /// `|peak - price| / peak`, or `None` for a non-positive peak.
    #[must_use]
    pub fn drawdown_ratio(peak: Decimal, price: Decimal) -> Option<Decimal> {
        if peak <= Decimal::ZERO {
            return None;
        }
        Some((peak - price).abs() / peak)
    }

    /// Protective stop for `sibling` after a group lot realized
    /// `realized_profit`: entry plus (long) or minus (short) profit times the
    /// sibling's multiplier.
    ///
    /// Returns `None` for inactive siblings, siblings already trailing, and
    /// siblings without a multiplier.
    #[must_use]
    pub fn protective_stop(
        sibling: &PositionSnapshot,
        realized_profit: Decimal,
    ) -> Option<Decimal> {
        if !sibling.is_active()
            || sibling.trailing_activated
            || sibling.stop_type == StopLossType::Trailing
        {
            return None;
        }
        let offset = realized_profit * sibling.protective_multiplier?;
        Some(match sibling.direction {
            PositionDirection::Long => sibling.entry_price + offset,
            PositionDirection::Short => sibling.entry_price - offset,
        })
    }

    fn stop_loss_trigger(position: &PositionSnapshot, price: Decimal, at: Timestamp) -> Trigger {
        Trigger::StopLoss(StopLossTrigger {
            position_id: position.id.clone(),
            group_id: position.group_id.clone(),
            price,
            stop_price: position.stop_loss,
            stop_type: position.stop_type,
            triggered_at: at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::{GroupId, PositionId, ProductCode};
    use crate::domain::stop_enforcement::value_objects::{
        LotStopRule, OpeningRange, PositionStatus,
    };
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn long_at(entry: Decimal) -> PositionSnapshot {
        PositionSnapshot::open(
            PositionId::new("p-1"),
            GroupId::new("g-1"),
            0,
            ProductCode::new("MXF"),
            PositionDirection::Long,
            entry,
            OpeningRange::new(entry + dec!(30), entry - dec!(50)),
            &LotStopRule::new(dec!(15), dec!(0.20)),
        )
    }

    fn short_at(entry: Decimal) -> PositionSnapshot {
        let mut p = long_at(entry);
        p.direction = PositionDirection::Short;
        p.stop_loss = entry + dec!(30);
        p
    }

    fn tick(p: &mut PositionSnapshot, price: Decimal) -> Option<Trigger> {
        let eval = StopStateMachine::evaluate(p, price, Timestamp::now());
        if let Some(update) = eval.trailing {
            StopStateMachine::apply(p, update);
        }
        eval.trigger
    }

    // Drawdown is measured against the peak price, so a 508 point retrace
    // from 22540 is a ratio of about 0.0225.
    #[test]
    fn long_scenario_activates_tracks_peak_and_exits_on_drawdown() {
        let mut p = long_at(dec!(22450));
        p.trailing_pullback_ratio = dec!(0.02);

        assert!(tick(&mut p, dec!(22470)).is_none());
        assert!(p.trailing_activated);
        assert_eq!(p.peak_price, Some(dec!(22470)));
        assert!(!p.is_initial_stop);

        assert!(tick(&mut p, dec!(22540)).is_none());
        assert_eq!(p.peak_price, Some(dec!(22540)));

        assert!(tick(&mut p, dec!(22432)).is_none());
        assert_eq!(p.peak_price, Some(dec!(22540)));

        let trigger = tick(&mut p, dec!(22032)).unwrap();
        let Trigger::Drawdown(drawdown) = trigger else {
            panic!("expected drawdown trigger");
        };
        assert_eq!(drawdown.peak_price, dec!(22540));
        assert!(drawdown.drawdown_ratio >= dec!(0.02));
        assert!(drawdown.drawdown_ratio < dec!(0.03));
    }

    #[test]
    fn only_activation_changes_the_stop_type() {
        let mut p = long_at(dec!(100));
        p.trailing_activated = true;
        p.peak_price = Some(dec!(120));
        p.stop_type = StopLossType::Protective;

        StopStateMachine::apply(&mut p, TrailingUpdate::PeakAdvanced { peak: dec!(125) });
        assert_eq!(p.stop_type, StopLossType::Protective);
        assert_eq!(p.peak_price, Some(dec!(125)));

        StopStateMachine::apply(&mut p, TrailingUpdate::PeakAdvanced { peak: dec!(121) });
        assert_eq!(p.peak_price, Some(dec!(125)));

        let mut q = long_at(dec!(100));
        StopStateMachine::apply(&mut q, TrailingUpdate::Activated { peak: dec!(115) });
        assert_eq!(q.stop_type, StopLossType::Trailing);
        assert!(q.trailing_activated);
    }

    #[test]
    fn below_threshold_does_not_activate() {
        let mut p = long_at(dec!(100));
        assert!(tick(&mut p, dec!(114)).is_none());
        assert!(!p.trailing_activated);
        assert!(p.peak_price.is_none());
    }

    #[test]
    fn hard_stop_before_activation() {
        let p = long_at(dec!(100));
        let eval = StopStateMachine::evaluate(&p, dec!(50), Timestamp::now());
        let Some(Trigger::StopLoss(stop)) = eval.trigger else {
            panic!("expected stop loss");
        };
        assert_eq!(stop.stop_price, dec!(50));
        assert_eq!(stop.stop_type, StopLossType::Initial);
    }

    #[test]
    fn short_stop_breach_and_activation() {
        let mut p = short_at(dec!(100));
        assert!(matches!(
            StopStateMachine::evaluate(&p, dec!(130), Timestamp::now()).trigger,
            Some(Trigger::StopLoss(_))
        ));
        assert!(tick(&mut p, dec!(85)).is_none());
        assert!(p.trailing_activated);
        assert!(tick(&mut p, dec!(80)).is_none());
        assert_eq!(p.peak_price, Some(dec!(80)));
        assert!(tick(&mut p, dec!(90)).is_none());
        assert!(matches!(tick(&mut p, dec!(96)), Some(Trigger::Drawdown(_))));
    }

    #[test]
    fn drawdown_wins_over_hard_stop() {
        let mut p = long_at(dec!(100));
        p.trailing_activated = true;
        p.peak_price = Some(dec!(120));
        p.stop_loss = dec!(95);
        let eval = StopStateMachine::evaluate(&p, dec!(90), Timestamp::now());
        assert!(matches!(eval.trigger, Some(Trigger::Drawdown(_))));
    }

    #[test]
    fn activated_without_peak_uses_tick_as_peak() {
        let mut p = long_at(dec!(100));
        p.trailing_activated = true;
        let eval = StopStateMachine::evaluate(&p, dec!(110), Timestamp::now());
        assert_eq!(eval.trailing, Some(TrailingUpdate::PeakAdvanced { peak: dec!(110) }));
        assert!(eval.trigger.is_none());
    }

    #[test]
    fn exited_position_is_ignored() {
        let mut p = long_at(dec!(100));
        p.status = PositionStatus::Exited;
        assert_eq!(
            StopStateMachine::evaluate(&p, dec!(0), Timestamp::now()),
            Evaluation::default()
        );
    }

    #[test]
    fn protective_stop_long_and_short() {
        let mut b = long_at(dec!(22450));
        b.protective_multiplier = Some(dec!(2));
        assert_eq!(StopStateMachine::protective_stop(&b, dec!(30)), Some(dec!(22510)));

        let mut s = short_at(dec!(22450));
        s.protective_multiplier = Some(dec!(2));
        assert_eq!(StopStateMachine::protective_stop(&s, dec!(30)), Some(dec!(22390)));
    }

    #[test]
    fn protective_stop_skips_trailing_and_unconfigured() {
        let mut b = long_at(dec!(100));
        assert_eq!(StopStateMachine::protective_stop(&b, dec!(10)), None);

        b.protective_multiplier = Some(dec!(2));
        b.trailing_activated = true;
        assert_eq!(StopStateMachine::protective_stop(&b, dec!(10)), None);
    }

    proptest! {
        #[test]
        fn long_peak_never_regresses(ticks in proptest::collection::vec(20_000i64..23_000, 1..60)) {
            let mut p = long_at(dec!(22450));
            p.trailing_activated = true;
            p.peak_price = Some(dec!(22470));
            p.stop_loss = dec!(0);
            p.trailing_pullback_ratio = dec!(0.99);
            let mut last_peak = dec!(22470);
            for t in ticks {
                tick(&mut p, Decimal::from(t));
                let peak = p.peak_price.unwrap();
                prop_assert!(peak >= last_peak);
                last_peak = peak;
            }
        }
    }
}
