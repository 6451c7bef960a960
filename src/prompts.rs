//! Fixed instruction sent with every uploaded document.
//!
//! The instruction is a constant: nothing the client sends is ever spliced
//! into it. Only the attached file varies between requests. Deployments that
//! need different wording override it through
//! [`crate::config::GatewayConfig::instruction`] at startup, never per request.

/// Model identifier used when none is configured.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Default instruction: extract the enumerated readings from a utility bill.
pub const DEFAULT_INSTRUCTION: &str = "From the attached electricity bill, report the total \
consumption, and across all meters the sums of the sharp-peak, peak, flat and valley readings, \
the sum of the maximum demand values, and each meter number. Give the numbers only, without \
units and without showing any calculation.";

/// Sentinel content returned when the reply has `choices` but no usable
/// `choices[0].message.content`.
pub const UNPARSEABLE_RESULT: &str = "cannot parse API result";
