use super::*;
use crate::backends::local::processors::{Add, ConstantSource, Format, Recorder, Scale, Sum};
use crate::backends::stub::PassThrough;
use crate::engine::{NetworkEvaluator, ProcessContext};
use crate::errors::{NetworkError, ProcessingError};
use crate::traits::{ProcessOutcome, Processor};

/// c (constant 2) -> s (scale 3) -> r (recorder)
fn chain() -> (ProcessorNetwork, [ProcessorId; 3]) {
    let mut network = ProcessorNetwork::new();
    let c = network
        .add_processor("c", Box::new(ConstantSource::new(2.0)))
        .unwrap();
    let s = network.add_processor("s", Box::new(Scale::new(3.0))).unwrap();
    let r = network.add_processor("r", Box::new(Recorder::new())).unwrap();
    network.add_connection("c.value", "s.input").unwrap();
    network.add_connection("s.output", "r.value").unwrap();
    (network, [c, s, r])
}

fn evaluated_chain() -> (ProcessorNetwork, [ProcessorId; 3]) {
    let (mut network, ids) = chain();
    NetworkEvaluator::with_defaults()
        .unwrap()
        .evaluate(&mut network);
    (network, ids)
}

struct Clashing;

impl Processor for Clashing {
    fn class_identifier(&self) -> &'static str {
        "clashing"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::inport::<f64>("x"),
            PortDescriptor::outport::<f64>("x"),
        ]
    }

    fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        Ok(ProcessOutcome::Complete)
    }
}

struct Dotted;

impl Processor for Dotted {
    fn class_identifier(&self) -> &'static str {
        "dotted"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![PortDescriptor::outport::<f64>("out.x")]
    }

    fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        Ok(ProcessOutcome::Complete)
    }
}

struct Styled;

impl Processor for Styled {
    fn class_identifier(&self) -> &'static str {
        "styled"
    }

    fn ports(&self) -> Vec<PortDescriptor> {
        vec![PortDescriptor::outport::<f64>("out")]
    }

    fn properties(&self) -> Vec<Property> {
        vec![
            Property::composite(
                "style",
                vec![
                    Property::new("width", 1.0),
                    Property::new("visible", true),
                ],
            ),
            Property::new("resolution", 64_i64)
                .with_invalidation_level(InvalidationLevel::InvalidResources),
        ]
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<ProcessOutcome, ProcessingError> {
        let width = ctx.property_float("style.width")?;
        ctx.set_output("out", width)?;
        Ok(ProcessOutcome::Complete)
    }
}

// ----- structural mutation --------------------------------------------------

#[test]
fn duplicate_identifiers_are_rejected() {
    let (mut network, _) = chain();
    let err = network
        .add_processor("c", Box::new(ConstantSource::new(1.0)))
        .unwrap_err();
    assert_eq!(err, NetworkError::DuplicateIdentifier("c".to_string()));
    assert_eq!(network.len(), 3);
}

#[test]
fn duplicate_port_identifiers_are_rejected() {
    let mut network = ProcessorNetwork::new();
    let err = network.add_processor("x", Box::new(Clashing)).unwrap_err();
    assert_eq!(
        err,
        NetworkError::DuplicatePort {
            processor: "x".to_string(),
            port: "x".to_string(),
        }
    );
    assert!(network.is_empty());
}

#[test]
fn identifiers_that_break_port_paths_are_rejected() {
    let mut network = ProcessorNetwork::new();
    for identifier in ["", "a.b", "."] {
        let err = network
            .add_processor(identifier, Box::new(ConstantSource::new(1.0)))
            .unwrap_err();
        assert_eq!(err, NetworkError::InvalidIdentifier(identifier.to_string()));
    }

    let err = network.add_processor("d", Box::new(Dotted)).unwrap_err();
    assert_eq!(
        err,
        NetworkError::InvalidPortIdentifier {
            processor: "d".to_string(),
            port: "out.x".to_string(),
        }
    );
    assert!(network.is_empty());
}

#[test]
fn new_processors_start_invalid_resources() {
    let (network, [c, s, r]) = chain();
    for id in [c, s, r] {
        assert_eq!(
            network.invalidation_level(id),
            Some(InvalidationLevel::InvalidResources)
        );
    }
}

#[test]
fn type_mismatch_leaves_network_unchanged() {
    let (mut network, _) = chain();
    network.add_processor("f", Box::new(Format::new())).unwrap();
    network.add_processor("s2", Box::new(Scale::new(1.0))).unwrap();
    let before = network.connections().to_vec();

    let err = network.add_connection("f.text", "s2.input").unwrap_err();

    assert!(matches!(err, NetworkError::TypeMismatch { .. }));
    assert_eq!(network.connections(), before.as_slice());
}

#[test]
fn single_inports_accept_one_connection() {
    let (mut network, _) = chain();
    network
        .add_processor("c2", Box::new(ConstantSource::new(1.0)))
        .unwrap();

    let err = network.add_connection("c2.value", "s.input").unwrap_err();

    assert_eq!(
        err,
        NetworkError::MultiplicityExceeded {
            inport: "s.input".to_string(),
            max: 1,
        }
    );
}

#[test]
fn bounded_multi_inports_enforce_their_maximum() {
    let mut network = ProcessorNetwork::new();
    network.add_processor("sum", Box::new(Sum::bounded(2))).unwrap();
    for name in ["a", "b", "c"] {
        network
            .add_processor(name, Box::new(ConstantSource::new(1.0)))
            .unwrap();
    }
    network.add_connection("a.value", "sum.values").unwrap();
    network.add_connection("b.value", "sum.values").unwrap();

    assert!(matches!(
        network.add_connection("c.value", "sum.values"),
        Err(NetworkError::MultiplicityExceeded { max: 2, .. })
    ));
}

#[test]
fn cycles_are_rejected() {
    let mut network = ProcessorNetwork::new();
    network.add_processor("a", Box::new(PassThrough::new())).unwrap();
    network.add_processor("b", Box::new(PassThrough::new())).unwrap();
    network.add_processor("c", Box::new(PassThrough::new())).unwrap();
    network.add_connection("a.out", "b.in").unwrap();
    network.add_connection("b.out", "c.in").unwrap();

    assert!(matches!(
        network.add_connection("c.out", "a.in"),
        Err(NetworkError::CycleDetected { .. })
    ));
    assert!(matches!(
        network.add_connection("a.out", "a.extra"),
        Err(NetworkError::CycleDetected { .. })
    ));
    assert_eq!(network.connections().len(), 2);
}

#[test]
fn duplicate_connections_are_rejected() {
    let (mut network, _) = chain();
    assert_eq!(
        network.add_connection("c.value", "s.input"),
        Err(NetworkError::AlreadyConnected {
            outport: "c.value".to_string(),
            inport: "s.input".to_string(),
        })
    );
}

#[test]
fn bad_port_paths_are_reported() {
    let (mut network, _) = chain();
    assert_eq!(
        network.add_connection("cvalue", "s.input"),
        Err(NetworkError::InvalidPortPath("cvalue".to_string()))
    );
    assert!(matches!(
        network.add_connection("c.nope", "s.input"),
        Err(NetworkError::PortNotFound { expected: "outport", .. })
    ));
    // "c.value" exists, but only as an outport.
    assert!(matches!(
        network.add_connection("s.output", "c.value"),
        Err(NetworkError::PortNotFound { expected: "inport", .. })
    ));
}

#[test]
fn removing_an_absent_connection_fails() {
    let (mut network, _) = chain();
    network.remove_connection("s.output", "r.value").unwrap();
    assert!(matches!(
        network.remove_connection("s.output", "r.value"),
        Err(NetworkError::NotConnected { .. })
    ));
    assert!(!network.is_connected("s.output", "r.value"));
}

#[test]
fn removing_a_processor_leaves_no_orphaned_connections() {
    let (mut network, [c, _, r]) = evaluated_chain();

    let removed = network.remove_processor("s").unwrap();

    assert_eq!(removed.class_identifier(), "scale");
    assert!(network.connections().is_empty());
    assert!(network.connections_of(c).is_empty());
    assert!(network.connections_of(r).is_empty());
    assert_eq!(network.processor_id("s"), None);
    assert_eq!(network.invalidation_level(r), Some(InvalidationLevel::InvalidOutput));
    assert_eq!(network.processor_state(r), Some(ProcessorState::NotReady));
    assert!(matches!(
        network.remove_processor("s"),
        Err(NetworkError::NotFound(_))
    ));
}

#[test]
fn ids_are_not_reused_after_removal() {
    let mut network = ProcessorNetwork::new();
    let a = network.add_processor("a", Box::new(PassThrough::new())).unwrap();
    network.remove_processor("a").unwrap();
    let b = network.add_processor("a", Box::new(PassThrough::new())).unwrap();
    assert_ne!(a, b);
    assert!(!network.contains(a));
    assert_eq!(network.processor_ids(), vec![b]);
}

#[test]
fn clear_empties_the_network() {
    let (mut network, _) = chain();
    network.clear();
    assert!(network.is_empty());
    assert!(network.connections().is_empty());
    assert!(network.topological_order().is_empty());
}

// ----- invalidation ---------------------------------------------------------

#[test]
fn evaluation_leaves_everything_valid() {
    let (network, ids) = evaluated_chain();
    for id in ids {
        assert_eq!(network.invalidation_level(id), Some(InvalidationLevel::Valid));
    }
    assert_eq!(network.outport_level("s.output"), Some(InvalidationLevel::Valid));
    assert!(!network.needs_evaluation());
}

#[test]
fn invalidation_flows_downstream_only() {
    let (mut network, [c, s, r]) = evaluated_chain();

    assert!(network.invalidate("s", InvalidationLevel::InvalidOutput).unwrap());

    assert_eq!(network.invalidation_level(c), Some(InvalidationLevel::Valid));
    assert_eq!(network.invalidation_level(s), Some(InvalidationLevel::InvalidOutput));
    assert_eq!(network.outport_level("s.output"), Some(InvalidationLevel::InvalidOutput));
    assert_eq!(network.invalidation_level(r), Some(InvalidationLevel::InvalidOutput));
    assert!(network.needs_evaluation());
}

#[test]
fn invalidation_never_lowers_a_level() {
    let (mut network, [_, s, _]) = chain();

    assert!(!network.invalidate_processor(s, InvalidationLevel::InvalidOutput));

    assert_eq!(
        network.invalidation_level(s),
        Some(InvalidationLevel::InvalidResources)
    );
}

#[test]
fn invalidating_an_outport_reaches_its_consumers() {
    let (mut network, [c, s, _]) = evaluated_chain();

    assert!(network
        .invalidate_outport("c.value", InvalidationLevel::InvalidOutput)
        .unwrap());

    assert_eq!(network.invalidation_level(c), Some(InvalidationLevel::Valid));
    assert_eq!(network.invalidation_level(s), Some(InvalidationLevel::InvalidOutput));

    // The owner republishes so its consumers become ready again.
    let report = NetworkEvaluator::with_defaults()
        .unwrap()
        .evaluate(&mut network);
    assert_eq!(report.completed, vec!["c", "s", "r"]);
    assert_eq!(network.outport_level("c.value"), Some(InvalidationLevel::Valid));
}

#[test]
fn new_connections_invalidate_the_destination() {
    let (mut network, [_, _, r]) = evaluated_chain();
    network.remove_connection("s.output", "r.value").unwrap();
    assert_eq!(network.invalidation_level(r), Some(InvalidationLevel::InvalidOutput));

    network.add_connection("s.output", "r.value").unwrap();

    assert_eq!(network.inport_changed("r.value"), Some(true));
}

// ----- properties -----------------------------------------------------------

#[test]
fn setting_a_property_invalidates_at_its_level() {
    let (mut network, [c, s, r]) = evaluated_chain();
    let revision = network.revision(s).unwrap();

    assert!(network.set_property("s", "factor", 4.0).unwrap());

    assert_eq!(network.property("s", "factor"), Some(&PropertyValue::Float(4.0)));
    assert_eq!(network.invalidation_level(c), Some(InvalidationLevel::Valid));
    assert_eq!(network.invalidation_level(s), Some(InvalidationLevel::InvalidOutput));
    assert_eq!(network.invalidation_level(r), Some(InvalidationLevel::InvalidOutput));
    assert!(network.revision(s).unwrap() > revision);
    assert!(network.is_modified());
}

#[test]
fn setting_an_equal_value_changes_nothing() {
    let (mut network, [_, s, _]) = evaluated_chain();
    assert!(!network.set_property("s", "factor", 3.0).unwrap());
    assert_eq!(network.invalidation_level(s), Some(InvalidationLevel::Valid));
}

#[test]
fn ints_widen_into_float_properties() {
    let (mut network, _) = chain();
    network.set_property("s", "factor", 5_i64).unwrap();
    assert_eq!(network.property("s", "factor"), Some(&PropertyValue::Float(5.0)));
}

#[test]
fn property_errors_name_the_problem() {
    let (mut network, _) = chain();
    network.add_processor("styled", Box::new(Styled)).unwrap();

    assert_eq!(
        network.set_property("s", "gain", 1.0),
        Err(NetworkError::PropertyNotFound {
            processor: "s".to_string(),
            path: "gain".to_string(),
        })
    );
    assert_eq!(
        network.set_property("s", "factor", "big"),
        Err(NetworkError::PropertyTypeMismatch {
            processor: "s".to_string(),
            path: "factor".to_string(),
            expected: "float",
            found: "text",
        })
    );
    assert!(matches!(
        network.set_property("styled", "style", 1.0),
        Err(NetworkError::PropertyNotAssignable { .. })
    ));
    assert!(matches!(
        network.set_property("ghost", "x", 1.0),
        Err(NetworkError::NotFound(_))
    ));
}

#[test]
fn nested_properties_are_addressed_by_path() {
    let mut network = ProcessorNetwork::new();
    let id = network.add_processor("styled", Box::new(Styled)).unwrap();
    NetworkEvaluator::with_defaults()
        .unwrap()
        .evaluate(&mut network);

    network.set_property("styled", "style.width", 2.5).unwrap();
    assert_eq!(network.invalidation_level(id), Some(InvalidationLevel::InvalidOutput));

    network.set_property("styled", "resolution", 128_i64).unwrap();
    assert_eq!(
        network.invalidation_level(id),
        Some(InvalidationLevel::InvalidResources)
    );
}

// ----- readiness ------------------------------------------------------------

#[test]
fn required_inports_gate_readiness() {
    let (network, [c, s, r]) = chain();
    assert_eq!(network.processor_state(c), Some(ProcessorState::Ready));
    // Upstream has not published yet.
    assert_eq!(network.processor_state(s), Some(ProcessorState::NotReady));
    assert_eq!(network.processor_state(r), Some(ProcessorState::NotReady));
}

#[test]
fn unconnected_optional_inports_do_not_block() {
    let mut network = ProcessorNetwork::new();
    network.add_processor("c", Box::new(ConstantSource::new(1.0))).unwrap();
    let add = network.add_processor("add", Box::new(Add::new())).unwrap();
    network.add_connection("c.value", "add.lhs").unwrap();
    assert!(!network.is_ready(add));

    NetworkEvaluator::with_defaults()
        .unwrap()
        .evaluate(&mut network);

    assert_eq!(*network.outport_data::<f64>("add.sum").unwrap(), 1.0);
}

#[test]
fn multi_inports_wait_for_every_connection() {
    let mut network = ProcessorNetwork::new();
    let sum = network.add_processor("sum", Box::new(Sum::new())).unwrap();
    assert!(!network.is_ready(sum), "a required multi inport needs a connection");

    network.add_processor("a", Box::new(ConstantSource::new(1.0))).unwrap();
    network.add_processor("b", Box::new(ConstantSource::new(2.0))).unwrap();
    network.add_connection("a.value", "sum.values").unwrap();
    network.add_connection("b.value", "sum.values").unwrap();

    let mut evaluator = NetworkEvaluator::with_defaults().unwrap();
    evaluator.evaluate(&mut network);
    assert_eq!(*network.outport_data::<f64>("sum.total").unwrap(), 3.0);

    network.invalidate("b", InvalidationLevel::InvalidOutput).unwrap();
    assert!(!network.is_ready(sum));
}

#[test]
fn processors_that_cannot_run_do_not_keep_evaluation_pending() {
    let mut network = ProcessorNetwork::new();
    let sum = network.add_processor("sum", Box::new(Sum::new())).unwrap();
    assert!(network.needs_evaluation());

    let report = NetworkEvaluator::with_defaults()
        .unwrap()
        .evaluate(&mut network);

    assert!(report.completed.is_empty());
    assert_ne!(network.invalidation_level(sum), Some(InvalidationLevel::Valid));
    assert!(!network.needs_evaluation());

    network.add_processor("a", Box::new(ConstantSource::new(1.0))).unwrap();
    network.add_connection("a.value", "sum.values").unwrap();
    assert!(network.needs_evaluation());
}

// ----- command queue --------------------------------------------------------

#[test]
fn commands_wait_until_applied() {
    let mut network = ProcessorNetwork::new();
    let handle = network.handle();

    std::thread::spawn(move || {
        handle
            .add_processor("c", Box::new(ConstantSource::new(1.0)))
            .unwrap();
        handle.add_processor("s", Box::new(Scale::new(2.0))).unwrap();
        handle.add_connection("c.value", "s.input").unwrap();
    })
    .join()
    .unwrap();

    assert!(network.is_empty());
    assert!(network.has_pending_commands());

    assert!(network.apply_pending_commands().is_empty());
    assert_eq!(network.len(), 2);
    assert!(network.is_connected("c.value", "s.input"));
    assert!(!network.has_pending_commands());
}

#[test]
fn rejected_commands_are_returned() {
    let (mut network, _) = chain();
    let handle = network.handle();
    handle.remove_processor("ghost").unwrap();
    handle.set_property("s", "factor", 2.0).unwrap();

    let errors = network.apply_pending_commands();

    assert_eq!(errors, vec![NetworkError::NotFound("ghost".to_string())]);
    assert_eq!(network.property("s", "factor"), Some(&PropertyValue::Float(2.0)));
}

#[test]
fn run_commands_get_the_network() {
    let (mut network, _) = chain();
    network.handle().run(|network| network.set_modified(false)).unwrap();

    network.apply_pending_commands();

    assert!(!network.is_modified());
}

#[test]
fn wait_for_commands_times_out_when_quiet() {
    let mut network = ProcessorNetwork::new();
    assert!(!network.wait_for_commands(std::time::Duration::from_millis(5)));

    network.handle().remove_processor("x").unwrap();
    assert!(network.wait_for_commands(std::time::Duration::from_millis(5)));
    assert!(network.has_pending_commands());
}
