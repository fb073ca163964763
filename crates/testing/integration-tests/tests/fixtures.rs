//! Properties every fixture program must satisfy
//!
//! Runs each program under `test-programs/` through the whole pipeline.

use integration_tests::{Fixture, invalid_dir, valid_dir};
use mc_driver::CompileError;
use mc_ir::{Function, InstKind, Instruction};

fn valid_fixtures() -> Vec<Fixture> {
    let fixtures = Fixture::load_dir(valid_dir()).unwrap();
    assert!(!fixtures.is_empty(), "no fixtures in {}", valid_dir().display());
    fixtures
}

/// Checks the structural invariants of a lowered function
fn assert_well_formed(name: &str, func: &Function) {
    assert_eq!(func.layout.first(), Some(&func.entry), "{name}: entry is not first");
    assert_eq!(func.layout.len(), func.blocks.len(), "{name}: detached blocks");

    for (_, block) in func.blocks_in_order() {
        let terminator = block
            .terminator
            .as_ref()
            .unwrap_or_else(|| panic!("{name}: block {} has no terminator", block.label));
        for target in terminator.successors() {
            assert!(
                func.layout.contains(&target),
                "{name}: {} branches outside the function",
                block.label
            );
        }

        let is_phi = |inst: &Instruction| matches!(inst.kind, InstKind::Phi { .. });
        let phis = func
            .block_insts(block)
            .take_while(|(_, inst)| is_phi(inst))
            .count();
        let all_phis = func.block_insts(block).filter(|(_, inst)| is_phi(inst)).count();
        assert_eq!(phis, all_phis, "{name}: phi after a non-phi in {}", block.label);
    }
}

#[test]
fn test_printed_programs_reparse_to_the_same_tree() {
    for fixture in valid_fixtures() {
        let program = mc_parser::parse_program(&fixture.source).unwrap();
        let printed = program.to_string();
        let reparsed = mc_parser::parse_program(&printed)
            .unwrap_or_else(|err| panic!("{}: printed form does not parse: {err}", fixture.name));
        assert_eq!(program, reparsed, "{}", fixture.name);
        assert_eq!(printed, reparsed.to_string(), "{}", fixture.name);
    }
}

#[test]
fn test_valid_programs_lower_to_well_formed_ir() {
    for fixture in valid_fixtures() {
        let compilation = fixture
            .compile()
            .unwrap_or_else(|err| panic!("{} failed to compile: {err}", fixture.name));
        assert_eq!(compilation.module.functions.len(), 1);
        let main = compilation.module.function("main").unwrap();
        assert_well_formed(&fixture.name, main);
    }
}

#[test]
fn test_invalid_programs_report_every_error() {
    let expected = [("calls", 3), ("redeclared", 1), ("unbound", 2)];
    let fixtures = Fixture::load_dir(invalid_dir()).unwrap();
    assert_eq!(fixtures.len(), expected.len());

    for (fixture, (name, count)) in fixtures.iter().zip(expected) {
        assert_eq!(fixture.name, name);
        match fixture.compile() {
            Err(CompileError::Resolve(failure)) => {
                assert_eq!(failure.errors.len(), count, "{name}: {:?}", failure.errors);
            }
            Err(other) => panic!("{name}: expected a resolution failure, got {other}"),
            Ok(_) => panic!("{name}: compiled without errors"),
        }
    }
}
