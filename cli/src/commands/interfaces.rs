use assetr_common::network::interface;

use crate::terminal::{network_fmt, print};

pub fn interfaces() {
    let selected: Option<String> = interface::detect_lan_interface().map(|i| i.name);
    let survey = interface::survey_interfaces();

    if survey.is_empty() {
        print::print_status("no interfaces found");
        return;
    }

    for (idx, (iface, verdict)) in survey.iter().enumerate() {
        let is_selected = selected.as_deref() == Some(iface.name.as_str());
        network_fmt::print_interface(iface, idx, verdict, is_selected);
        if idx + 1 != survey.len() {
            print::blank();
        }
    }
}
