use crate::error::EngineError;

/// Pick a MIDI input port by index. `None` takes the first one.
pub fn select_port<S: AsRef<str>>(
    names: &[S],
    requested: Option<usize>,
) -> Result<usize, EngineError> {
    if names.is_empty() {
        return Err(EngineError::NoMidiDevice);
    }

    let index = requested.unwrap_or(0);
    if index >= names.len() {
        return Err(EngineError::MidiPortOutOfRange {
            index,
            available: names.len(),
        });
    }

    log::info!("using MIDI port {index}: {}", names[index].as_ref());
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_port_list() {
        let names: [&str; 0] = [];
        assert!(matches!(
            select_port(&names, None),
            Err(EngineError::NoMidiDevice)
        ));
    }

    #[test]
    fn defaults_to_first_port() {
        assert_eq!(select_port(&["a", "b"], None).ok(), Some(0));
        assert_eq!(select_port(&["a", "b"], Some(1)).ok(), Some(1));
    }

    #[test]
    fn out_of_range_index() {
        assert!(matches!(
            select_port(&["a", "b"], Some(2)),
            Err(EngineError::MidiPortOutOfRange {
                index: 2,
                available: 2
            })
        ));
    }
}
