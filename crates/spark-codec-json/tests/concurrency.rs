//! 并发解析与编解码测试：多个线程同时首次请求同一批描述符，结果必须一致。

use std::thread;

use spark_codec_json::{TypeDescriptor, provide_registry};

#[test]
fn concurrent_first_use_produces_identical_output() {
    let registry = provide_registry();
    let descriptors = [
        TypeDescriptor::immutable_list(TypeDescriptor::string()),
        TypeDescriptor::immutable_set(TypeDescriptor::int()),
        TypeDescriptor::immutable_sorted_map(TypeDescriptor::string(), TypeDescriptor::int()),
        TypeDescriptor::immutable_multimap(TypeDescriptor::string(), TypeDescriptor::bool()),
    ];
    let inputs = [
        r#"["x","y","x"]"#,
        "[3,1,2]",
        r#"{"a":1,"b":2}"#,
        r#"{"k":[true,false]}"#,
    ];

    let outputs: Vec<Vec<String>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    descriptors
                        .iter()
                        .zip(inputs)
                        .map(|(ty, text)| {
                            let value = registry.from_json(text, ty).unwrap();
                            registry.to_json(&value, ty).unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for output in &outputs {
        assert_eq!(output.as_slice(), inputs.as_slice());
    }
    assert!(registry.cached_adapters() >= descriptors.len());
}
