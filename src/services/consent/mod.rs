/*!
 * Privacy consent gate
 *
 * Responsibility:
 * - Hold the consent state of this install and block the app until it is recorded
 * - Persist through `ConsentStore`; the failure policy is explicit config
 */

mod gate;
mod types;

pub use gate::ConsentGate;
pub use types::{ConsentCategory, ConsentExport, ConsentOutcome, ConsentRecord, ConsentSelections};
