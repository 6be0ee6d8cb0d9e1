//! Dirty-column bitsets carried from the differs to the writers.
//!
//! Each update decision records exactly which columns diverged from the
//! template side so the writer emits only those columns. The sets are plain
//! `u32` newtypes; a set with no bits means "nothing to write".

macro_rules! update_flags {
    ($(#[$doc:meta])* $name:ident { $($(#[$fdoc:meta])* $flag:ident = $bit:expr,)+ }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name(u32);

        impl $name {
            $($(#[$fdoc])* pub const $flag: $name = $name(1 << $bit);)+

            /// The empty set.
            pub const fn none() -> Self {
                $name(0)
            }

            /// Returns true when no column is marked.
            pub const fn is_empty(&self) -> bool {
                self.0 == 0
            }

            /// Marks the given column.
            pub fn set(&mut self, flag: $name) {
                self.0 |= flag.0;
            }

            /// Returns true when the given column is marked.
            pub const fn contains(&self, flag: $name) -> bool {
                self.0 & flag.0 != 0
            }
        }
    };
}

update_flags! {
    /// Trigger columns adopted from the template on re-link.
    TriggerUpdateFlags {
        /// `flags` column.
        FLAGS = 0,
        /// `recovery_mode` column.
        RECOVERY_MODE = 1,
        /// `correlation_mode` column.
        CORRELATION_MODE = 2,
        /// `manual_close` column.
        MANUAL_CLOSE = 3,
        /// `opdata` column.
        OPDATA = 4,
        /// `discover` column.
        DISCOVER = 5,
        /// `event_name` column.
        EVENT_NAME = 6,
    }
}

update_flags! {
    /// Host-prototype scalar columns.
    PrototypeUpdateFlags {
        /// Visible name.
        NAME = 0,
        /// Monitoring status.
        STATUS = 1,
        /// Discover flag.
        DISCOVER = 2,
        /// Custom-interfaces mode.
        CUSTOM_INTERFACES = 3,
    }
}

update_flags! {
    /// Prototype macro columns.
    MacroUpdateFlags {
        /// Macro value.
        VALUE = 0,
        /// Macro description.
        DESCRIPTION = 1,
        /// Macro type (text / secret / vault).
        TYPE = 2,
    }
}

update_flags! {
    /// Prototype tag columns; tags pair positionally, so both may change.
    TagUpdateFlags {
        /// Tag name.
        TAG = 0,
        /// Tag value.
        VALUE = 1,
    }
}

update_flags! {
    /// Prototype interface columns. Tested bit by bit in the writer; the
    /// SNMP sub-record carries its own set.
    InterfaceUpdateFlags {
        /// Default-interface marker.
        MAIN = 0,
        /// Interface type.
        TYPE = 1,
        /// Connect via IP or DNS.
        USEIP = 2,
        /// IP address.
        IP = 3,
        /// DNS name.
        DNS = 4,
        /// Port.
        PORT = 5,
    }
}

update_flags! {
    /// SNMP interface detail columns.
    SnmpUpdateFlags {
        /// Protocol version.
        VERSION = 0,
        /// Bulk requests.
        BULK = 1,
        /// v1/v2 community.
        COMMUNITY = 2,
        /// v3 security name.
        SECNAME = 3,
        /// v3 security level.
        SECLEVEL = 4,
        /// v3 authentication passphrase.
        AUTHPASS = 5,
        /// v3 privacy passphrase.
        PRIVPASS = 6,
        /// v3 authentication protocol.
        AUTHPROTO = 7,
        /// v3 privacy protocol.
        PRIVPROTO = 8,
        /// v3 context name.
        CONTEXT = 9,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_contains_nothing() {
        let flags = TriggerUpdateFlags::none();
        assert!(flags.is_empty());
        assert!(!flags.contains(TriggerUpdateFlags::OPDATA));
    }

    #[test]
    fn set_and_contains() {
        let mut flags = TriggerUpdateFlags::none();
        flags.set(TriggerUpdateFlags::FLAGS);
        flags.set(TriggerUpdateFlags::EVENT_NAME);

        assert!(!flags.is_empty());
        assert!(flags.contains(TriggerUpdateFlags::FLAGS));
        assert!(flags.contains(TriggerUpdateFlags::EVENT_NAME));
        assert!(!flags.contains(TriggerUpdateFlags::DISCOVER));
    }

    #[test]
    fn interface_bits_are_distinct() {
        let all = [
            InterfaceUpdateFlags::MAIN,
            InterfaceUpdateFlags::TYPE,
            InterfaceUpdateFlags::USEIP,
            InterfaceUpdateFlags::IP,
            InterfaceUpdateFlags::DNS,
            InterfaceUpdateFlags::PORT,
        ];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                let mut flags = InterfaceUpdateFlags::none();
                flags.set(*a);
                assert_eq!(flags.contains(*b), i == j);
            }
        }
    }
}
