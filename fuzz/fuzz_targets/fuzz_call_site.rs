#![no_main]

//! Fuzz target for call-site validation
//!
//! Builds arbitrary call-site trees and checks the validator against a
//! direct recursive model of the lifetime rules.

use arbitrary::Arbitrary;
use callsite_validator::{CallSite, CallSiteValidator, DiError, ServiceType};
use libfuzzer_sys::fuzz_target;

struct S0;
struct S1;
struct S2;
struct S3;

fn service(idx: u8) -> ServiceType {
    match idx % 4 {
        0 => ServiceType::of::<S0>(),
        1 => ServiceType::of::<S1>(),
        2 => ServiceType::of::<S2>(),
        _ => ServiceType::of::<S3>(),
    }
}

/// Tree shape chosen by the fuzzer
#[derive(Debug, Arbitrary)]
enum Node {
    Transient(Box<Node>),
    Constructor(u8, Vec<Node>),
    Singleton(u8, Box<Node>),
    Scoped(u8, Box<Node>),
    ScopeAccessor(u8),
    Enumerable(u8, Vec<Node>),
    Intercepted(Box<Node>),
    Constant(u8),
    CreateInstance(u8),
    Instance(u8),
    Factory(u8),
    Provider,
    ScopeService,
}

fn build(node: &Node, depth: usize) -> CallSite {
    if depth > 24 {
        return CallSite::ServiceProviderService;
    }
    let child = |n: &Node| build(n, depth + 1);
    match node {
        Node::Transient(inner) => CallSite::transient(child(inner)),
        Node::Constructor(ty, params) => {
            CallSite::constructor(service(*ty), params.iter().take(6).map(child).collect())
        }
        Node::Singleton(ty, inner) => CallSite::singleton(service(*ty), child(inner)),
        Node::Scoped(ty, inner) => CallSite::scoped(service(*ty), child(inner)),
        Node::ScopeAccessor(ty) => CallSite::scoped(service(*ty), CallSite::ServiceScopeService),
        Node::Enumerable(ty, items) => {
            CallSite::enumerable(service(*ty), items.iter().take(6).map(child).collect())
        }
        Node::Intercepted(inner) => CallSite::intercepted(child(inner)),
        Node::Constant(ty) => CallSite::Constant { service_type: service(*ty) },
        Node::CreateInstance(ty) => CallSite::CreateInstance { implementation: service(*ty) },
        Node::Instance(ty) => CallSite::InstanceService { service_type: service(*ty) },
        Node::Factory(ty) => CallSite::FactoryService { service_type: service(*ty) },
        Node::Provider => CallSite::ServiceProviderService,
        Node::ScopeService => CallSite::ServiceScopeService,
    }
}

/// Reference model of the rules.
fn expected(
    site: &CallSite,
    singleton: Option<ServiceType>,
) -> Result<Option<ServiceType>, DiError> {
    match site {
        CallSite::Singleton(s) => expected(&s.service, Some(s.service_type)),
        CallSite::Scoped(s) => {
            if matches!(*s.service, CallSite::ServiceScopeService) {
                Ok(None)
            } else if let Some(holder) = singleton {
                Err(DiError::scoped_in_singleton(s.service_type, holder))
            } else {
                Ok(Some(s.service_type))
            }
        }
        CallSite::Transient(s) => expected(&s.service, singleton),
        CallSite::Interception(s) => expected(&s.target, singleton),
        CallSite::Constructor(_) | CallSite::ClosedEnumerable(_) => {
            let mut first = None;
            for child in site.children() {
                let found = expected(child, singleton)?;
                first = first.or(found);
            }
            Ok(first)
        }
        _ => Ok(None),
    }
}

fuzz_target!(|input: (u8, Node)| {
    let (root_ty, node) = input;
    let root = service(root_ty);
    let site = build(&node, 0);

    let validator = CallSiteValidator::new();
    let outcome = validator.validate_call_site(root, &site);
    assert_eq!(outcome, expected(&site, None));

    match outcome {
        Ok(Some(scoped)) => {
            assert_eq!(validator.captured(root), Some(scoped));
            let err = validator.validate_resolution(root, true).unwrap_err();
            assert_eq!(err, DiError::resolved_from_root(root, scoped));
            assert_eq!(validator.validate_resolution(root, true), Err(err));
        }
        Ok(None) | Err(_) => {
            assert!(validator.is_empty());
            assert!(validator.validate_resolution(root, true).is_ok());
        }
    }
    assert!(validator.validate_resolution(root, false).is_ok());
});
