//! v1 REST endpoint catalogue.
//!
//! Every endpoint carries its path relative to the server URL and the query
//! preset used for bulk extraction. Collection endpoints default to
//! `perPage=1000`, the largest page size the platform honours (its own
//! default is 100).
//!
//! A few endpoints address a single parent object; their templates hold an
//! `{id}` placeholder, filled in by [`Endpoint::url_with_id`].

const ACCOUNT: &str = "/restapi/v1.0/account/~";
const DICTIONARY: &str = "/restapi/v1.0/dictionary";
const ID: &str = "{id}";

const PER_PAGE: &str = "perPage=1000";
const PER_PAGE_DETAILED: &str = "perPage=1000&view=Detailed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    // Voice
    BusinessHours,
    AnsweringRule,
    ForwardAllCalls,
    CallLog,
    ActiveCalls,
    CallMonitoringGroups,
    CallMonitoringGroupMembers,
    CallQueues,
    CallQueueMembers,
    CallRecording,
    CallRecordingExtensions,
    CustomGreetings,
    Greeting,
    IvrPrompts,
    IvrMenus,
    // Account
    Account,
    BusinessAddress,
    ServiceInfo,
    CustomFields,
    Sites,
    SiteMembers,
    SiteIvr,
    PhoneNumber,
    Presence,
    CallQueuePresence,
    Language,
    Country,
    Location,
    State,
    Timezone,
    Permission,
    PermissionCategory,
    // Provisioning
    EmergencyUsers,
    WirelessPoints,
    Networks,
    Devices,
    Switches,
    EmergencyLocations,
    Extension,
    Templates,
    // Roles and permissions
    AssignedRole,
    UserRole,
    UserRoleDefault,
}

impl Endpoint {
    pub const ALL: [Endpoint; 43] = [
        Endpoint::BusinessHours,
        Endpoint::AnsweringRule,
        Endpoint::ForwardAllCalls,
        Endpoint::CallLog,
        Endpoint::ActiveCalls,
        Endpoint::CallMonitoringGroups,
        Endpoint::CallMonitoringGroupMembers,
        Endpoint::CallQueues,
        Endpoint::CallQueueMembers,
        Endpoint::CallRecording,
        Endpoint::CallRecordingExtensions,
        Endpoint::CustomGreetings,
        Endpoint::Greeting,
        Endpoint::IvrPrompts,
        Endpoint::IvrMenus,
        Endpoint::Account,
        Endpoint::BusinessAddress,
        Endpoint::ServiceInfo,
        Endpoint::CustomFields,
        Endpoint::Sites,
        Endpoint::SiteMembers,
        Endpoint::SiteIvr,
        Endpoint::PhoneNumber,
        Endpoint::Presence,
        Endpoint::CallQueuePresence,
        Endpoint::Language,
        Endpoint::Country,
        Endpoint::Location,
        Endpoint::State,
        Endpoint::Timezone,
        Endpoint::Permission,
        Endpoint::PermissionCategory,
        Endpoint::EmergencyUsers,
        Endpoint::WirelessPoints,
        Endpoint::Networks,
        Endpoint::Devices,
        Endpoint::Switches,
        Endpoint::EmergencyLocations,
        Endpoint::Extension,
        Endpoint::Templates,
        Endpoint::AssignedRole,
        Endpoint::UserRole,
        Endpoint::UserRoleDefault,
    ];

    /// Path template, relative to the server URL.
    pub fn path(self) -> String {
        let (base, rest) = self.parts();
        format!("{base}{rest}")
    }

    /// Query preset for bulk extraction, without the leading `?`.
    pub fn default_query(self) -> Option<&'static str> {
        use Endpoint::*;
        match self {
            CallLog | ActiveCalls => Some(PER_PAGE_DETAILED),
            Location => Some("perPage=1000&stateId={id}"),
            State => Some("perPage=1000&allCountries=True"),
            AnsweringRule | CallMonitoringGroups | CallMonitoringGroupMembers | CallQueues
            | CallQueueMembers | Greeting | IvrPrompts | Sites | PhoneNumber | Presence
            | Language | Country | Timezone | Permission | PermissionCategory | EmergencyUsers
            | WirelessPoints | Networks | Devices | Switches | EmergencyLocations | Extension
            | Templates | AssignedRole | UserRole => Some(PER_PAGE),
            BusinessHours | ForwardAllCalls | CallRecording | CallRecordingExtensions
            | CustomGreetings | IvrMenus | Account | BusinessAddress | ServiceInfo
            | CustomFields | SiteMembers | SiteIvr | CallQueuePresence | UserRoleDefault => None,
        }
    }

    /// Whether the URL needs an object id (in the path or the query).
    pub fn requires_id(self) -> bool {
        self.template().contains(ID)
    }

    /// Full URL with the query preset. `None` if an id is required.
    pub fn url(self, server_url: &str) -> Option<String> {
        if self.requires_id() {
            return None;
        }
        Some(self.join(server_url))
    }

    /// Full URL with `id` substituted into the template.
    pub fn url_with_id(self, server_url: &str, id: i64) -> String {
        self.join(server_url).replace(ID, &id.to_string())
    }

    fn join(self, server_url: &str) -> String {
        format!("{}{}", server_url.trim_end_matches('/'), self.template())
    }

    fn template(self) -> String {
        match self.default_query() {
            Some(query) => format!("{}?{}", self.path(), query),
            None => self.path(),
        }
    }

    fn parts(self) -> (&'static str, &'static str) {
        use Endpoint::*;
        match self {
            BusinessHours => (ACCOUNT, "/business-hours"),
            AnsweringRule => (ACCOUNT, "/answering-rule"),
            ForwardAllCalls => (ACCOUNT, "/forward-all-calls"),
            CallLog => (ACCOUNT, "/call-log"),
            ActiveCalls => (ACCOUNT, "/active-calls"),
            CallMonitoringGroups => (ACCOUNT, "/call-monitoring-groups"),
            CallMonitoringGroupMembers => (ACCOUNT, "/call-monitoring-groups/{id}/members"),
            CallQueues => (ACCOUNT, "/call-queues"),
            CallQueueMembers => (ACCOUNT, "/call-queues/{id}/members"),
            CallRecording => (ACCOUNT, "/call-recording"),
            CallRecordingExtensions => (ACCOUNT, "/call-recording/extensions"),
            CustomGreetings => (ACCOUNT, "/call-recording/custom-greetings"),
            Greeting => (DICTIONARY, "/greeting"),
            IvrPrompts => (ACCOUNT, "/ivr-prompts"),
            IvrMenus => (ACCOUNT, "/ivr-menus"),
            Account => (ACCOUNT, ""),
            BusinessAddress => (ACCOUNT, "/business-address"),
            ServiceInfo => (ACCOUNT, "/service-info"),
            CustomFields => (ACCOUNT, "/custom-fields"),
            Sites => (ACCOUNT, "/sites"),
            SiteMembers => (ACCOUNT, "/sites/{id}/members"),
            SiteIvr => (ACCOUNT, "/sites/{id}/ivr"),
            PhoneNumber => (ACCOUNT, "/phone-number"),
            Presence => (ACCOUNT, "/presence"),
            CallQueuePresence => (ACCOUNT, "/call-queues/{id}/presence"),
            Language => (DICTIONARY, "/language"),
            Country => (DICTIONARY, "/country"),
            Location => (DICTIONARY, "/location"),
            State => (DICTIONARY, "/state"),
            Timezone => (DICTIONARY, "/timezone"),
            Permission => (DICTIONARY, "/permission"),
            PermissionCategory => (DICTIONARY, "/permission-category"),
            EmergencyUsers => (ACCOUNT, "/emergency-address-auto-update/users"),
            WirelessPoints => (ACCOUNT, "/emergency-address-auto-update/wireless-points"),
            Networks => (ACCOUNT, "/emergency-address-auto-update/networks"),
            Devices => (ACCOUNT, "/emergency-address-auto-update/devices"),
            Switches => (ACCOUNT, "/emergency-address-auto-update/switches"),
            EmergencyLocations => (ACCOUNT, "/emergency-locations"),
            Extension => (ACCOUNT, "/extension"),
            Templates => (ACCOUNT, "/templates"),
            AssignedRole => (ACCOUNT, "/assigned-role"),
            UserRole => (ACCOUNT, "/user-role"),
            UserRoleDefault => (ACCOUNT, "/user-role/default"),
        }
    }
}
