use crate::addr::{AddressRange, FormatError};
use crate::error::ParamError;
use crate::flow::{
    FlowBuilder, FlowOptions, MAX_RANGE_VALUES, TagSpec, header_overhead, payload_len,
};

#[test]
fn defaults_build_one_flow_per_field() {
    let spec = FlowOptions::new("eth0").build().unwrap();
    assert_eq!(spec.src_ip[0].to_string(), "1.1.1.1");
    assert_eq!(spec.dst_ip[0].to_string(), "1.1.1.2");
    assert_eq!(spec.src_mac[0].to_string(), "c6:0f:aa:aa:00:00");
    assert_eq!(spec.dst_mac[0].to_string(), "c6:0f:bb:bb:00:00");
    assert_eq!(spec.src_port[0].get(), 10000);
    assert_eq!(spec.dst_port[0].get(), 20000);
    assert_eq!(spec.frame_size, 64);
    assert_eq!(spec.payload_len, 64 - 46);
    assert_eq!(spec.tag, TagSpec::None);
    assert_eq!(spec.egress_interface, "eth0");
    assert!(spec.send.continuous);
    assert!(!spec.send.verbose);
    assert_eq!(FlowBuilder::new("eth0").build().unwrap(), spec);
}

#[test]
fn ranges_expand_independently() {
    let mut opts = FlowOptions::new("eth1");
    opts.src_ip = "10.0.0.1,4".into();
    opts.dst_port = "5000,2".into();
    let spec = opts.build().unwrap();
    assert_eq!(spec.src_ip.len(), 4);
    assert_eq!(spec.dst_ip.len(), 1);
    assert_eq!(spec.dst_port.len(), 2);
    assert_eq!(spec.src_ip[3].to_string(), "10.0.0.4");
}

#[test]
fn header_overhead_per_tag_kind() {
    assert_eq!(header_overhead(&TagSpec::None), 46);
    assert_eq!(header_overhead(&TagSpec::dot1q(100, 3).unwrap()), 50);
    assert_eq!(header_overhead(&TagSpec::qinq(100, 200, 0).unwrap()), 54);
}

#[test]
fn frame_exactly_fitting_headers_has_empty_payload() {
    let cases = [
        (TagSpec::None, 46),
        (TagSpec::dot1q(10, 0).unwrap(), 50),
        (TagSpec::qinq(10, 20, 0).unwrap(), 54),
    ];
    for (tag, min) in cases {
        assert_eq!(payload_len(min, &tag).unwrap(), 0);
        assert!(
            matches!(payload_len(min - 1, &tag), Err(ParamError::Validation(_))),
            "{tag:?} with {} bytes should fail",
            min - 1
        );
    }
}

#[test]
fn undersized_frame_fails_build() {
    let err = FlowBuilder::new("eth0").frame_size(40).build().unwrap_err();
    assert!(matches!(err, ParamError::Validation(_)));
}

#[test]
fn dot1q_option_parses_vlan_and_priority() {
    assert_eq!(
        TagSpec::from_options(Some("100,5"), None).unwrap(),
        TagSpec::Dot1q {
            vlan: 100,
            priority: 5
        }
    );
    assert_eq!(
        TagSpec::from_options(Some("100"), None).unwrap(),
        TagSpec::Dot1q {
            vlan: 100,
            priority: 0
        }
    );
    // 全零等同于未设置
    assert_eq!(
        TagSpec::from_options(Some("0,0"), None).unwrap(),
        TagSpec::None
    );
}

#[test]
fn qinq_option_single_value_sets_both_layers() {
    assert_eq!(
        TagSpec::from_options(None, Some("300")).unwrap(),
        TagSpec::Qinq {
            outer_vlan: 300,
            inner_vlan: 300,
            priority: 0
        }
    );
    assert_eq!(
        TagSpec::from_options(None, Some("300,400,7")).unwrap(),
        TagSpec::Qinq {
            outer_vlan: 300,
            inner_vlan: 400,
            priority: 7
        }
    );
}

#[test]
fn dot1q_and_qinq_together_is_a_configuration_error() {
    let err = TagSpec::from_options(Some("100,0"), Some("200,300,0")).unwrap_err();
    assert!(matches!(err, ParamError::Configuration(_)));

    let mut opts = FlowOptions::new("eth0");
    opts.dot1q = Some("100".into());
    opts.qinq = Some("200,300".into());
    assert!(matches!(opts.build(), Err(ParamError::Configuration(_))));
}

#[test]
fn all_zero_qinq_is_not_set() {
    assert_eq!(
        TagSpec::from_options(None, Some("0,0,0")).unwrap(),
        TagSpec::None
    );
    assert_eq!(
        TagSpec::from_options(Some("100,1"), Some("0,0,0")).unwrap(),
        TagSpec::Dot1q {
            vlan: 100,
            priority: 1
        }
    );
}

#[test]
fn qinq_inner_or_priority_without_outer_is_never_dropped() {
    // 与 802.1Q 同时给出时是冲突
    assert!(matches!(
        TagSpec::from_options(Some("100"), Some("0,300,5")),
        Err(ParamError::Configuration(_))
    ));
    // 单独给出时缺少外层 VLAN
    assert!(matches!(
        TagSpec::from_options(None, Some("0,300,5")),
        Err(ParamError::Validation(_))
    ));
    assert!(matches!(
        TagSpec::from_options(None, Some("0,0,3")),
        Err(ParamError::Validation(_))
    ));
}

#[test]
fn out_of_range_tag_values_are_format_errors() {
    assert!(matches!(
        TagSpec::dot1q(4096, 0),
        Err(ParamError::Format(FormatError::Value { .. }))
    ));
    assert!(matches!(
        TagSpec::from_options(Some("100,8"), None),
        Err(ParamError::Format(FormatError::Value { .. }))
    ));
    assert!(matches!(
        TagSpec::from_options(None, Some("1,2,3,4")),
        Err(ParamError::Format(FormatError::Value { .. }))
    ));
    assert!(matches!(
        TagSpec::from_options(Some("abc"), None),
        Err(ParamError::Format(_))
    ));
}

#[test]
fn tagged_frame_reduces_payload() {
    let spec = FlowBuilder::new("eth0")
        .frame_size(128)
        .tag(TagSpec::qinq(10, 20, 1).unwrap())
        .src_port(AddressRange::parse("1000,8").unwrap())
        .build()
        .unwrap();
    assert_eq!(spec.payload_len, 128 - 54);
    assert_eq!(spec.src_port.len(), 8);
}

#[test]
fn bad_address_option_surfaces_format_error() {
    let mut opts = FlowOptions::new("eth0");
    opts.dst_mac = "c6:0f:bb:bb:00".into();
    assert!(matches!(
        opts.build(),
        Err(ParamError::Format(FormatError::Address { .. }))
    ));
}

#[test]
fn flow_spec_json_shape() {
    let mut opts = FlowOptions::new("eth0");
    opts.dot1q = Some("100,3".into());
    let spec = opts.build().unwrap();
    let v = serde_json::to_value(&spec).unwrap();
    assert_eq!(v["src_ip"][0], "1.1.1.1");
    assert_eq!(v["tag"]["kind"], "dot1q");
    assert_eq!(v["tag"]["vlan"], 100);
    assert_eq!(v["send"]["loop"], true);
    assert_eq!(v["payload_len"], 64 - 50);
}

#[test]
fn oversized_range_is_rejected_before_allocation() {
    let mut opts = FlowOptions::new("eth0");
    opts.src_ip = "1.1.1.1,4294967295".into();
    assert!(matches!(opts.build(), Err(ParamError::Validation(_))));

    let mut opts = FlowOptions::new("eth0");
    opts.dst_port = format!("1,{}", MAX_RANGE_VALUES + 1);
    assert!(matches!(opts.build(), Err(ParamError::Validation(_))));
}

#[test]
fn range_at_the_limit_is_accepted() {
    let mut opts = FlowOptions::new("eth0");
    opts.src_port = format!("0,{MAX_RANGE_VALUES}");
    let spec = opts.build().unwrap();
    assert_eq!(spec.src_port.len(), MAX_RANGE_VALUES as usize);
    // 端口空间只有 65536 个值，超出部分回绕
    assert_eq!(spec.src_port[65536].get(), 0);
}
