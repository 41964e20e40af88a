//! Known command names for the external (CXR/SW) and internal (CXRF)
//! consoles, with subcommands, descriptions and permission masks.

use crate::proto::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub subcommands: &'static [&'static str],
    pub description: &'static str,
    /// Permission mask required by the external console; 0 for internal.
    pub permission: u32,
}

impl CatalogEntry {
    pub fn has_subcommands(&self) -> bool {
        !self.subcommands.is_empty()
    }
}

const fn entry(
    name: &'static str,
    subcommands: &'static [&'static str],
    description: &'static str,
    permission: u32,
) -> CatalogEntry {
    CatalogEntry {
        name,
        subcommands,
        description,
        permission,
    }
}

/// External commands, accepted in CXR and SW modes.
pub static EXTERNAL: &[CatalogEntry] = &[
    entry("AUTH1", &[], "", 0x0000C0EF),
    entry("AUTH2", &[], "", 0x0000C0EF),
    entry("AUTHVER", &["GET", "SET"], "", 0x0000C0DF),
    entry("BOOT", &["MODE", "CONT"], "", 0x000080D5),
    entry("BOOTENABLE", &[], "", 0x0000809A),
    entry("BUZ", &[], "", 0x00008096),
    entry("CID", &["GET"], "", 0x0000C0D5),
    entry("CSAREA", &["GET", "SET"], "", 0x0000C0DF),
    entry("ECID", &["GET"], "", 0x0000C0D5),
    entry("EEP", &["GET", "SET", "INIT"], "", 0x0000C0DF),
    entry("ERRLOG", &["GET", "CLEAR", "START", "STOP"], "", 0x0000C0DF),
    entry("FAN", &["GETDUTY", "GETPOLICY", "SETDUTY", "SETPOLICY", "START", "STOP"], "", 0x0000C0D7),
    entry("HALT", &[], "", 0x0000C0D5),
    entry("KSV", &[], "", 0x0000C0D5),
    entry("PDAREA", &["GET", "SET"], "", 0x0000C0DF),
    entry("PORTSTAT", &[], "", 0x0000C0DF),
    entry("R8", &[], "", 0x0000C0DF),
    entry("R16", &[], "", 0x0000C0DF),
    entry("R32", &[], "", 0x0000C0DF),
    entry("RBE", &[], "", 0x0000C0D5),
    entry("REV", &["SB"], "", 0x0000C0D5),
    entry("SERVFAN", &[], "", 0x0000C0D7),
    entry("SHUTDOWN", &[], "", 0x0000C0D5),
    entry("SPU", &["INFO"], "", 0x0000C0D5),
    entry("VER", &[], "", 0x0000C0FF),
    entry("VID", &["GET"], "", 0x0000C0D5),
    entry("W8", &[], "", 0x0000C0DF),
    entry("W16", &[], "", 0x0000C0DF),
    entry("W32", &[], "", 0x0000C0DF),
    entry("WBE", &[], "", 0x0000C0D5),
];

/// Internal console commands (CXRF).
pub static INTERNAL: &[CatalogEntry] = &[
    entry("becount", &[], "Display bringup/shutdown count + Power-on time", 0),
    entry("bepgoff", &[], "BE power grid off", 0),
    entry("bepkt", &["show", "set", "unset", "mode", "debug", "help"], "Packet permissions", 0),
    entry("bestat", &[], "Get status of BE", 0),
    entry("boardconfig", &[], "Displays board configuration", 0),
    entry("bootbeep", &["stat", "on", "off"], "Boot beep", 0),
    entry("bringup", &[], "Turn PS3 on", 0),
    entry("bsn", &[], "Get board serial number", 0),
    entry("bstatus", &[], "HDMI related status", 0),
    entry("buzz", &[], "Activate buzzer [freq]", 0),
    entry("buzzpattern", &[], "Buzzer pattern [freq] [pattern] [count]", 0),
    entry("clear_err", &["last", "eeprom", "all"], "Clear errors", 0),
    entry("clearerrlog", &[], "Clears error log", 0),
    entry("comm", &[], "Communication mode", 0),
    entry("commt", &["help", "start", "stop", "send"], "Manual BE communication", 0),
    entry("cp", &["ready", "busy", "reset", "beepremote", "beep2kn1n3", "beep2kn2n3"], "CP control commands", 0),
    entry("csum", &[], "Firmware checksum", 0),
    entry("devpm", &["ata", "pci", "pciex", "rsx"], "Device power management", 0),
    entry("diag", &[], "Diag (execute without param to show help)", 0),
    entry("disp_err", &[], "Displays errors", 0),
    entry("duty", &["get", "set", "getmin", "setmin", "getmax", "setmax", "getinmin", "setinmin", "getinmax", "setinmax"], "Fan policy", 0),
    entry("dve", &["help", "set", "save", "show"], "DVE chip parameters", 0),
    entry("eepcsum", &[], "Shows eeprom checksum", 0),
    entry("eepromcheck", &[], "Check eeprom [id]", 0),
    entry("eeprominit", &[], "Init eeprom [id]", 0),
    entry("ejectsw", &[], "Eject switch", 0),
    entry("errlog", &[], "Gets the error log", 0),
    entry("fancon", &[], "Does nothing", 0),
    entry("fanconautotype", &[], "Does nothing", 0),
    entry("fanconmode", &["get"], "Fan control mode", 0),
    entry("fanconpolicy", &["get", "set", "getini", "setini"], "Fan control policy", 0),
    entry("fandiag", &[], "Fan test", 0),
    entry("faninictrl", &[], "Does nothing", 0),
    entry("fanpol", &[], "Does nothing", 0),
    entry("fanservo", &[], "Does nothing", 0),
    entry("fantbl", &["get", "set", "getini", "setini", "gettable", "settable"], "Fan table", 0),
    entry("firmud", &[], "Firmware update", 0),
    entry("geterrlog", &[], "Gets error log [id]", 0),
    entry("getrtc", &[], "Gets rtc", 0),
    entry("halt", &[], "Halts syscon", 0),
    entry("hdmi", &[], "HDMI (various commands, use help)", 0),
    entry("hdmiid", &[], "Get HDMI id's", 0),
    entry("hdmiid2", &[], "Get HDMI id's", 0),
    entry("hversion", &[], "Platform ID", 0),
    entry("hyst", &["get", "set", "getini", "setini"], "Temperature zones", 0),
    entry("lasterrlog", &[], "Last error from log", 0),
    entry("ledmode", &[], "Get led mode [id] [id]", 0),
    entry("LS", &[], "LabStation Mode", 0),
    entry("ltstest", &["get", "set be", "rsx"], "Temp related values", 0),
    entry("osbo", &[], "Sets 0x2000F60", 0),
    entry("patchcsum", &[], "Patch checksum", 0),
    entry("patchvereep", &[], "Patch version eeprom", 0),
    entry("patchverram", &[], "Patch version ram", 0),
    entry("poll", &[], "Poll log", 0),
    entry("portscan", &[], "Scan port [port]", 0),
    entry("powbtnmode", &[], "Power button mode [mode (0/1)]", 0),
    entry("powerstate", &[], "Get power state", 0),
    entry("powersw", &[], "Power switch", 0),
    entry("powupcause", &[], "Power up cause", 0),
    entry("printmode", &[], "Set printmode [mode (0/1/2/3)]", 0),
    entry("printpatch", &[], "Prints patch", 0),
    entry("r", &[], "Read byte from SC [offset] [length]", 0),
    entry("r16", &[], "Read word from SC [offset] [length]", 0),
    entry("r32", &[], "Read dword from SC [offset] [length]", 0),
    entry("r64", &[], "Read qword from SC [offset] [length]", 0),
    entry("r64d", &[], "Read qword data from SC [offset] [length]", 0),
    entry("rbe", &[], "Read from BE [offset]", 0),
    entry("recv", &[], "Receive something", 0),
    entry("resetsw", &[], "Reset switch", 0),
    entry("restartlogerrtoeep", &[], "Reenable error logging to eeprom", 0),
    entry("revision", &[], "Get softid", 0),
    entry("rrsxc", &[], "Read from RSX [offset] [length]", 0),
    entry("rtcreset", &[], "Reset RTC", 0),
    entry("scagv2", &[], "Auth related", 0),
    entry("scasv2", &[], "Auth related", 0),
    entry("scclose", &[], "Auth related", 0),
    entry("scopen", &[], "Auth related", 0),
    entry("send", &[], "Send something [variable]", 0),
    entry("shutdown", &[], "PS3 shutdown", 0),
    entry("startlogerrtsk", &[], "Start error log task", 0),
    entry("stoplogerrtoeep", &[], "Stop error logging to eeprom", 0),
    entry("stoplogerrtsk", &[], "Stop error log task", 0),
    entry("syspowdown", &[], "System power down (3 params 0 0 0)", 0),
    entry("task", &[], "Print tasks", 0),
    entry("thalttest", &[], "Does nothing", 0),
    entry("thermfatalmode", &["canboot", "cannotboot"], "Set thermal boot mode", 0),
    entry("therrclr", &[], "Thermal register clear", 0),
    entry("thrm", &[], "Does nothing", 0),
    entry("tmp", &[], "Get temperature [zone]", 0),
    entry("trace", &[], "Trace tasks (use help)", 0),
    entry("trp", &["get", "set", "getini", "setini"], "Temperature zones", 0),
    entry("tsensor", &[], "Get raw temperature [sensor]", 0),
    entry("tshutdown", &["get", "set", "getini", "setini"], "Thermal shutdown", 0),
    entry("tshutdowntime", &[], "Thermal shutdown time [time]", 0),
    entry("tzone", &[], "Show thermal zones", 0),
    entry("version", &[], "SC firmware version", 0),
    entry("w", &[], "Write byte to SC [offset] [value]", 0),
    entry("w16", &[], "Write word to SC [offset] [value]", 0),
    entry("w32", &[], "Write dword to SC [offset] [value]", 0),
    entry("w64", &[], "Write qword to SC [offset] [value]", 0),
    entry("wbe", &[], "Write to BE [offset] [value]", 0),
    entry("wmmto", &["get"], "Get watch dog timeout", 0),
    entry("wrsxc", &[], "Write to RSX [offset] [value]", 0),
    entry("xdrdiag", &["start", "info", "result"], "XDR diag", 0),
    entry("xiodiag", &[], "XIO diag", 0),
    entry("xrcv", &[], "Xmodem receive", 0),
];

pub fn external_names() -> Vec<&'static str> {
    EXTERNAL.iter().map(|e| e.name).collect()
}

pub fn internal_names() -> Vec<&'static str> {
    INTERNAL.iter().map(|e| e.name).collect()
}

/// Case-insensitive, whitespace-tolerant lookup of an external command.
pub fn lookup_external(name: &str) -> Option<&'static CatalogEntry> {
    let name = name.trim().to_ascii_uppercase();
    EXTERNAL.iter().find(|e| e.name == name)
}

/// Case-sensitive lookup of an internal command; surrounding space is ignored.
pub fn lookup_internal(name: &str) -> Option<&'static CatalogEntry> {
    let name = name.trim();
    INTERNAL.iter().find(|e| e.name == name)
}

pub fn catalog_for(mode: Mode) -> &'static [CatalogEntry] {
    match mode {
        Mode::Cxr | Mode::Sw => EXTERNAL,
        Mode::Cxrf => INTERNAL,
    }
}

/// Lookup with the case rules of the mode's console.
pub fn lookup(mode: Mode, name: &str) -> Option<&'static CatalogEntry> {
    match mode {
        Mode::Cxr | Mode::Sw => lookup_external(name),
        Mode::Cxrf => lookup_internal(name),
    }
}
