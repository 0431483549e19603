use std::thread;

use anyhow::Result;

use framework::*;
use phobos_rg::prelude::*;

mod framework;

fn noop_type(name: &str, description: &str) -> PassTypeDesc<MockDevice> {
    PassTypeDesc::from_fn(name, |ctx: &mut CompileContext<'_, MockDevice>| -> Result<()> {
        ctx.set_render_pass_fn(|_: &mut PassContext<'_, MockDevice>| -> Result<()> { Ok(()) });
        Ok(())
    })
    .description(description)
}

#[test]
fn list_is_sorted() -> Result<()> {
    let registry = Registry::new();
    registry.register(noop_type("Tonemap", ""))?;
    registry.register(noop_type("Bloom", ""))?;
    registry.register(noop_type("Composite", ""))?;
    assert_eq!(registry.list()?, vec!["Bloom", "Composite", "Tonemap"]);
    Ok(())
}

#[test]
fn register_replaces_by_name() -> Result<()> {
    let registry = Registry::new();
    registry.register(noop_type("Blur", "old").input("src", ""))?;
    registry.register(noop_type("Blur", "new").input("src", "").output("dst", "Blurred image"))?;

    assert_eq!(registry.list()?.len(), 1);
    let desc = registry.get("Blur")?;
    assert_eq!(desc.description, "new");
    assert_eq!(desc.output_parameters, vec![PassParameter {
        name: String::from("dst"),
        description: String::from("Blurred image"),
    }]);
    Ok(())
}

#[test]
fn missing_pass_type() -> Result<()> {
    let registry = Registry::<MockDevice>::new();
    let err = registry.get("Nope").unwrap_err();
    assert!(matches!(error_of(&err), Error::PassTypeNotFound(name) if name == "Nope"));

    registry.register(noop_type("Nope", ""))?;
    assert!(registry.get("Nope").is_ok());
    assert!(registry.unregister("Nope")?);
    assert!(!registry.unregister("Nope")?);
    assert!(registry.get("Nope").is_err());
    Ok(())
}

#[test]
fn clones_share_the_table() -> Result<()> {
    let registry = Registry::new();
    let clone = registry.clone();
    clone.register(noop_type("Shared", ""))?;
    assert_eq!(registry.list()?, vec!["Shared"]);
    Ok(())
}

#[test]
fn concurrent_registration() -> Result<()> {
    let registry = Registry::new();
    let threads = (0..8)
        .map(|t| {
            let registry = registry.clone();
            thread::spawn(move || {
                for i in 0..16 {
                    registry.register(noop_type(&format!("Pass{t}_{i}"), "")).unwrap();
                    registry.list().unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for thread in threads {
        thread.join().unwrap();
    }
    assert_eq!(registry.list()?.len(), 8 * 16);
    Ok(())
}

#[test]
fn graph_sees_types_registered_after_construction() -> Result<()> {
    let registry = Registry::new();
    let mut desc = RenderGraphDesc::default();
    let out = desc.add_resource(ResourceNode::transient("out", buffer(64)).output());
    let pass = desc.add_pass(PassNode::new("late", "Late"));
    desc.add_output(pass, "out", out);

    let mut graph = RenderGraphBuilder::new(MockDevice::new(), registry.clone()).desc(desc).build();
    assert!(graph.compile(CompileOptions::default()).is_err());

    registry.register(noop_type("Late", "").output("out", ""))?;
    graph.compile(CompileOptions::default())?;
    graph.execute(&mut MockCommandStream::new())?;
    Ok(())
}

#[test]
fn callbacks_can_use_the_registry() -> Result<()> {
    let registry = Registry::new();
    let inner = registry.clone();
    registry.register(
        PassTypeDesc::from_fn("Introspect", move |ctx: &mut CompileContext<'_, MockDevice>| -> Result<()> {
            // The table is not locked while a compile callback runs
            assert!(inner.list()?.contains(&String::from("Introspect")));
            inner.register(noop_type("Spawned", ""))?;
            let runtime = inner.clone();
            ctx.set_render_pass_fn(move |_: &mut PassContext<'_, MockDevice>| -> Result<()> {
                runtime.get("Spawned")?;
                Ok(())
            });
            Ok(())
        })
        .output("out", ""),
    )?;

    let mut desc = RenderGraphDesc::default();
    let out = desc.add_resource(ResourceNode::transient("out", buffer(64)).output());
    let pass = desc.add_pass(PassNode::new("introspect", "Introspect"));
    desc.add_output(pass, "out", out);

    let mut graph = RenderGraphBuilder::new(MockDevice::new(), registry.clone()).desc(desc).build();
    graph.compile(CompileOptions::default())?;
    graph.execute(&mut MockCommandStream::new())?;
    assert_eq!(registry.list()?, vec!["Introspect", "Spawned"]);
    Ok(())
}
