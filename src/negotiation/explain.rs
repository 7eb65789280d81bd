//! One-sentence rationales for offers.
//!
//! Rules are an ordered table evaluated top-down; the first rule whose
//! predicate holds renders the explanation. The last rule always applies.

use crate::negotiation::belief::OpponentStance;
use crate::types::Role;

/// Everything the rule table may look at when explaining one offer
#[derive(Clone, Debug, PartialEq)]
pub struct ExplanationContext {
    pub side: Role,
    pub price: f64,
    pub last_opponent_offer: Option<f64>,
    pub target_price: f64,
    pub concession_rate: f64,
    pub aggressiveness: f64,
    pub fairness: f64,
    pub market_price: Option<f64>,
    pub opponent_stance: Option<OpponentStance>,
}

struct Rule {
    name: &'static str,
    applies: fn(&ExplanationContext) -> bool,
    render: fn(&ExplanationContext) -> String,
}

const RULES: &[Rule] = &[
    Rule {
        name: "opening",
        applies: |c| c.last_opponent_offer.is_none(),
        render: render_opening,
    },
    Rule {
        name: "stubborn_opponent",
        applies: |c| c.opponent_stance == Some(OpponentStance::Stubborn),
        render: |c| {
            format!(
                "Opponent is being stubborn (conceding slowly), so I'm holding firm at ${:.2}.",
                c.price
            )
        },
    },
    Rule {
        name: "cooperative_opponent",
        applies: |c| c.opponent_stance == Some(OpponentStance::Cooperative),
        render: |c| {
            format!(
                "Opponent is cooperative, so I'm making a fair concession to ${:.2}.",
                c.price
            )
        },
    },
    Rule {
        name: "aggressive",
        applies: |c| c.aggressiveness > 0.7,
        render: |c| {
            let direction = match c.side {
                Role::Buyer => "down",
                Role::Seller => "up",
            };
            format!(
                "Aggressively pushing price {} to ${:.2} to maximize my advantage.",
                direction, c.price
            )
        },
    },
    Rule {
        name: "generous",
        applies: |c| c.aggressiveness < 0.3,
        render: |c| {
            format!(
                "Making a generous concession to ${:.2} to improve cooperation.",
                c.price
            )
        },
    },
    Rule {
        name: "low_fairness",
        applies: |c| c.fairness < 0.5,
        render: |c| {
            format!(
                "Conceded to ${:.2} to improve fairness (current: {:.1}%).",
                c.price,
                c.fairness * 100.0
            )
        },
    },
    Rule {
        name: "high_fairness",
        applies: |c| c.fairness > 0.8,
        render: |c| {
            format!(
                "Maintaining strong position at ${:.2} with high fairness ({:.1}%).",
                c.price,
                c.fairness * 100.0
            )
        },
    },
    Rule {
        name: "beats_market",
        applies: beats_market,
        render: render_market,
    },
    Rule {
        name: "concession",
        applies: |_| true,
        render: render_concession,
    },
];

/// Explain an offer. Identical contexts always yield identical text.
pub fn explain_offer(context: &ExplanationContext) -> String {
    let rule = select_rule(context);
    (rule.render)(context)
}

/// Name of the rule that fires for `context`
pub fn rule_name(context: &ExplanationContext) -> &'static str {
    select_rule(context).name
}

fn select_rule(context: &ExplanationContext) -> &'static Rule {
    RULES
        .iter()
        .find(|rule| (rule.applies)(context))
        .unwrap_or(&RULES[RULES.len() - 1])
}

fn render_opening(c: &ExplanationContext) -> String {
    match c.market_price {
        Some(market) if (c.price - market).abs() < (c.target_price - market).abs() => format!(
            "Starting at ${:.2}, adjusted toward market price of ${:.2}.",
            c.price, market
        ),
        _ => format!("Opening offer at ${:.2}, my target price.", c.price),
    }
}

fn beats_market(c: &ExplanationContext) -> bool {
    match (c.market_price, c.side) {
        (Some(market), Role::Buyer) => c.price < market,
        (Some(market), Role::Seller) => c.price > market,
        (None, _) => false,
    }
}

fn render_market(c: &ExplanationContext) -> String {
    let market = c.market_price.unwrap_or_default();
    match c.side {
        Role::Buyer => format!(
            "Offering ${:.2}, below market price of ${:.2}, to secure a good deal.",
            c.price, market
        ),
        Role::Seller => format!(
            "Offering ${:.2}, above market price of ${:.2}, capitalizing on market conditions.",
            c.price, market
        ),
    }
}

fn render_concession(c: &ExplanationContext) -> String {
    let last = c.last_opponent_offer.unwrap_or(c.price);
    let movement = match c.side {
        Role::Buyer => last - c.price,
        Role::Seller => c.price - last,
    };

    if movement.abs() > 0.01 {
        let pct = movement.abs() / last.abs().max(1.0) * 100.0;
        format!(
            "Conceded {:.1}% to ${:.2} to move toward agreement.",
            pct, c.price
        )
    } else {
        format!(
            "Proposing ${:.2} to balance my target and opponent's position.",
            c.price
        )
    }
}
