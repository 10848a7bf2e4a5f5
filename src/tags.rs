//! EAS code pages and tag names.
//!
//! A global tag number packs the code page above the 6-bit tag index:
//! `(page << PAGE_SHIFT) | index`. Indices below `TAG_BASE` are WBXML
//! global tokens and never name a tag.

pub const PAGE_SHIFT: u16 = 6;
pub const PAGE_MASK: u8 = 0x3F;
pub const TAG_BASE: u8 = 5;

pub const AIRSYNC: u8 = 0;
pub const CONTACTS: u8 = 1;
pub const EMAIL: u8 = 2;
pub const AIRNOTIFY: u8 = 3;
pub const CALENDAR: u8 = 4;
pub const MOVE: u8 = 5;
pub const GET_ITEM_ESTIMATE: u8 = 6;
pub const FOLDER_HIERARCHY: u8 = 7;
pub const MEETING_RESPONSE: u8 = 8;
pub const TASKS: u8 = 9;
pub const RESOLVE_RECIPIENTS: u8 = 10;
pub const VALIDATE_CERT: u8 = 11;
pub const CONTACTS2: u8 = 12;
pub const PING: u8 = 13;
pub const PROVISION: u8 = 14;
pub const SEARCH: u8 = 15;
pub const GAL: u8 = 16;
pub const AIRSYNC_BASE: u8 = 17;
pub const SETTINGS: u8 = 18;
pub const DOCUMENT_LIBRARY: u8 = 19;
pub const ITEM_OPERATIONS: u8 = 20;
pub const COMPOSE_MAIL: u8 = 21;
pub const EMAIL2: u8 = 22;
pub const NOTES: u8 = 23;
pub const RIGHTS_MANAGEMENT: u8 = 24;

struct CodePage {
    name: &'static str,
    tags: &'static [&'static str],
}

static PAGES: [CodePage; 25] = [
    CodePage {
        name: "AirSync",
        tags: &[
            "Sync", "Responses", "Add", "Change", "Delete", "Fetch", "SyncKey", "ClientId",
            "ServerId", "Status", "Collection", "Class", "Version", "CollectionId", "GetChanges",
            "MoreAvailable", "WindowSize", "Commands", "Options", "FilterType", "Truncation",
            "RTFTruncation", "Conflict", "Collections", "ApplicationData", "DeletesAsMoves",
            "NotifyGUID", "Supported", "SoftDelete", "MIMESupport", "MIMETruncation", "Wait",
            "Limit", "Partial", "ConversationMode", "MaxItems", "HeartbeatInterval",
        ],
    },
    CodePage {
        name: "Contacts",
        tags: &[
            "Anniversary", "AssistantName", "AssistantTelephoneNumber", "Birthday", "Body",
            "BodySize", "BodyTruncated", "Business2TelephoneNumber", "BusinessAddressCity",
            "BusinessAddressCountry", "BusinessAddressPostalCode", "BusinessAddressState",
            "BusinessAddressStreet", "BusinessFaxNumber", "BusinessTelephoneNumber",
            "CarTelephoneNumber", "Categories", "Category", "Children", "Child", "CompanyName",
            "Department", "Email1Address", "Email2Address", "Email3Address", "FileAs",
            "FirstName", "Home2TelephoneNumber", "HomeAddressCity", "HomeAddressCountry",
            "HomeAddressPostalCode", "HomeAddressState", "HomeAddressStreet", "HomeFaxNumber",
            "HomeTelephoneNumber", "JobTitle", "LastName", "MiddleName", "MobileTelephoneNumber",
            "OfficeLocation", "OtherAddressCity", "OtherAddressCountry", "OtherAddressPostalCode",
            "OtherAddressState", "OtherAddressStreet", "PagerNumber", "RadioTelephoneNumber",
            "Spouse", "Suffix", "Title", "WebPage", "YomiCompanyName", "YomiFirstName",
            "YomiLastName", "CompressedRTF", "Picture", "Alias", "WeightedRank",
        ],
    },
    CodePage {
        name: "Email",
        tags: &[
            "Attachment", "Attachments", "AttName", "AttSize", "Att0Id", "AttMethod",
            "AttRemoved", "Body", "BodySize", "BodyTruncated", "DateReceived", "DisplayName",
            "DisplayTo", "Importance", "MessageClass", "Subject", "Read", "To", "Cc", "From",
            "ReplyTo", "AllDayEvent", "Categories", "Category", "DTStamp", "EndTime",
            "InstanceType", "BusyStatus", "Location", "MeetingRequest", "Organizer",
            "RecurrenceId", "Reminder", "ResponseRequested", "Recurrences", "Recurrence",
            "Recurrence_Type", "Recurrence_Until", "Recurrence_Occurrences",
            "Recurrence_Interval", "Recurrence_DayOfWeek", "Recurrence_DayOfMonth",
            "Recurrence_WeekOfMonth", "Recurrence_MonthOfYear", "StartTime", "Sensitivity",
            "TimeZone", "GlobalObjId", "ThreadTopic", "MIMEData", "MIMETruncated", "MIMESize",
            "InternetCPID", "Flag", "FlagStatus", "ContentClass", "FlagType", "CompleteTime",
            "DisallowNewTimeProposal",
        ],
    },
    CodePage {
        name: "AirNotify",
        tags: &[
            "Notify", "Notification", "Version", "Lifetime", "DeviceInfo", "Enable", "Folder",
            "ServerId", "DeviceAddress", "ValidCarrierProfiles", "CarrierProfile", "Status",
            "Responses", "Devices", "Device", "Id", "Expiry", "NotifyGUID", "DeviceFriendlyName",
        ],
    },
    CodePage {
        name: "Calendar",
        tags: &[
            "TimeZone", "AllDayEvent", "Attendees", "Attendee", "Email", "Name", "Body",
            "BodyTruncated", "BusyStatus", "Categories", "Category", "CompressedRTF", "DTStamp",
            "EndTime", "Exception", "Exceptions", "Deleted", "ExceptionStartTime", "Location",
            "MeetingStatus", "OrganizerEmail", "OrganizerName", "Recurrence", "Type", "Until",
            "Occurrences", "Interval", "DayOfWeek", "DayOfMonth", "WeekOfMonth", "MonthOfYear",
            "Reminder", "Sensitivity", "Subject", "StartTime", "UID", "AttendeeStatus",
            "AttendeeType", "Attachment", "Attachments", "AttName", "AttSize", "AttOid",
            "AttMethod", "AttRemoved", "DisplayName", "DisallowNewTimeProposal",
            "ResponseRequested", "AppointmentReplyTime", "ResponseType", "CalendarType",
            "IsLeapMonth", "FirstDayOfWeek", "OnlineMeetingConfLink", "OnlineMeetingExternalLink",
        ],
    },
    CodePage {
        name: "Move",
        tags: &[
            "MoveItems", "Move", "SrcMsgId", "SrcFldId", "DstFldId", "Response", "Status",
            "DstMsgId",
        ],
    },
    CodePage {
        name: "GetItemEstimate",
        tags: &[
            "GetItemEstimate", "Version", "Collections", "Collection", "Class", "CollectionId",
            "DateTime", "Estimate", "Response", "Status",
        ],
    },
    CodePage {
        name: "FolderHierarchy",
        tags: &[
            "Folders", "Folder", "DisplayName", "ServerId", "ParentId", "Type", "Response",
            "Status", "ContentClass", "Changes", "Add", "Delete", "Update", "SyncKey",
            "FolderCreate", "FolderDelete", "FolderUpdate", "FolderSync", "Count", "Version",
        ],
    },
    CodePage {
        name: "MeetingResponse",
        tags: &[
            "CalendarId", "CollectionId", "MeetingResponse", "RequestId", "Request", "Result",
            "Status", "UserResponse", "Version", "InstanceId",
        ],
    },
    CodePage {
        name: "Tasks",
        tags: &[
            "Body", "BodySize", "BodyTruncated", "Categories", "Category", "Complete",
            "DateCompleted", "DueDate", "UtcDueDate", "Importance", "Recurrence", "Type",
            "Start", "Until", "Occurrences", "Interval", "DayOfMonth", "DayOfWeek",
            "WeekOfMonth", "MonthOfYear", "Regenerate", "DeadOccur", "ReminderSet",
            "ReminderTime", "Sensitivity", "StartDate", "UtcStartDate", "Subject",
            "CompressedRTF", "OrdinalDate", "SubOrdinalDate", "CalendarType", "IsLeapMonth",
            "FirstDayOfWeek",
        ],
    },
    CodePage {
        name: "ResolveRecipients",
        tags: &[
            "ResolveRecipients", "Response", "Status", "Type", "Recipient", "DisplayName",
            "EmailAddress", "Certificates", "Certificate", "MiniCertificate", "Options", "To",
            "CertificateRetrieval", "RecipientCount", "MaxCertificates",
            "MaxAmbiguousRecipients", "CertificateCount", "Availability", "StartTime", "EndTime",
            "MergedFreeBusy", "Picture", "MaxSize", "Data", "MaxPictures",
        ],
    },
    CodePage {
        name: "ValidateCert",
        tags: &[
            "ValidateCert", "Certificates", "Certificate", "CertificateChain", "CheckCRL",
            "Status",
        ],
    },
    CodePage {
        name: "Contacts2",
        tags: &[
            "CustomerId", "GovernmentId", "IMAddress", "IMAddress2", "IMAddress3", "ManagerName",
            "CompanyMainPhone", "AccountName", "NickName", "MMS",
        ],
    },
    CodePage {
        name: "Ping",
        tags: &[
            "Ping", "AutdState", "Status", "HeartbeatInterval", "Folders", "Folder", "Id",
            "Class", "MaxFolders",
        ],
    },
    CodePage {
        name: "Provision",
        tags: &[
            "Provision", "Policies", "Policy", "PolicyType", "PolicyKey", "Data", "Status",
            "RemoteWipe", "EASProvisionDoc", "DevicePasswordEnabled",
            "AlphanumericDevicePasswordRequired", "RequireStorageCardEncryption",
            "PasswordRecoveryEnabled", "DocumentBrowseEnabled", "AttachmentsEnabled",
            "MinDevicePasswordLength", "MaxInactivityTimeDeviceLock",
            "MaxDevicePasswordFailedAttempts", "MaxAttachmentSize", "AllowSimpleDevicePassword",
            "DevicePasswordExpiration", "DevicePasswordHistory", "AllowStorageCard",
            "AllowCamera", "RequireDeviceEncryption", "AllowUnsignedApplications",
            "AllowUnsignedInstallationPackages", "MinDevicePasswordComplexCharacters",
            "AllowWiFi", "AllowTextMessaging", "AllowPOPIMAPEmail", "AllowBluetooth",
            "AllowIrDA", "RequireManualSyncWhenRoaming", "AllowDesktopSync",
            "MaxCalendarAgeFilter", "AllowHTMLEmail", "MaxEmailAgeFilter",
            "MaxEmailBodyTruncationSize", "MaxEmailHTMLBodyTruncationSize",
            "RequireSignedSMIMEMessages", "RequireEncryptedSMIMEMessages",
            "RequireSignedSMIMEAlgorithm", "RequireEncryptionSMIMEAlgorithm",
            "AllowSMIMEEncryptionAlgorithmNegotiation", "AllowSMIMESoftCerts", "AllowBrowser",
            "AllowConsumerEmail", "AllowRemoteDesktop", "AllowInternetSharing",
            "UnapprovedInROMApplicationList", "ApplicationName", "ApprovedApplicationList",
            "Hash", "AccountOnlyRemoteWipe",
        ],
    },
    CodePage {
        name: "Search",
        tags: &[
            "Search", "Stores", "Store", "Name", "Query", "Options", "Range", "Status",
            "Response", "Result", "Properties", "Total", "EqualTo", "Value", "And", "Or",
            "FreeText", "SubstringOp", "DeepTraversal", "LongId", "RebuildResults", "LessThan",
            "GreaterThan", "Schema", "Supported", "UserName", "Password", "ConversationId",
            "Picture", "MaxSize", "MaxPictures",
        ],
    },
    CodePage {
        name: "Gal",
        tags: &[
            "DisplayName", "Phone", "Office", "Title", "Company", "Alias", "FirstName",
            "LastName", "HomePhone", "MobilePhone", "EmailAddress", "Picture", "Status", "Data",
        ],
    },
    CodePage {
        name: "AirSyncBase",
        tags: &[
            "BodyPreference", "Type", "TruncationSize", "AllOrNone", "Reserved", "Body", "Data",
            "EstimatedDataSize", "Truncated", "Attachments", "Attachment", "DisplayName",
            "FileReference", "Method", "ContentId", "ContentLocation", "IsInline",
            "NativeBodyType", "ContentType", "Preview", "BodyPartPreference", "BodyPart",
            "Status",
        ],
    },
    CodePage {
        name: "Settings",
        tags: &[
            "Settings", "Status", "Get", "Set", "Oof", "OofState", "StartTime", "EndTime",
            "OofMessage", "AppliesToInternal", "AppliesToExternalKnown",
            "AppliesToExternalUnknown", "Enabled", "ReplyMessage", "BodyType", "DevicePassword",
            "Password", "DeviceInformation", "Model", "IMEI", "FriendlyName", "OS", "OSLanguage",
            "PhoneNumber", "UserInformation", "EmailAddresses", "SmtpAddress", "UserAgent",
            "EnableOutboundSMS", "MobileOperator", "PrimarySmtpAddress", "Accounts", "Account",
            "AccountId", "AccountName", "UserDisplayName", "SendDisabled", "Reserved",
            "RightsManagementInformation",
        ],
    },
    CodePage {
        name: "DocumentLibrary",
        tags: &[
            "LinkId", "DisplayName", "IsFolder", "CreationDate", "LastModifiedDate", "IsHidden",
            "ContentLength", "ContentType",
        ],
    },
    CodePage {
        name: "ItemOperations",
        tags: &[
            "ItemOperations", "Fetch", "Store", "Options", "Range", "Total", "Properties", "Data",
            "Status", "Response", "Version", "Schema", "Part", "EmptyFolderContents",
            "DeleteSubFolders", "UserName", "Password", "Move", "DstFldId", "ConversationId",
            "MoveAlways",
        ],
    },
    CodePage {
        name: "ComposeMail",
        tags: &[
            "SendMail", "SmartForward", "SmartReply", "SaveInSentItems", "ReplaceMime", "Type",
            "Source", "FolderId", "ItemId", "LongId", "InstanceId", "MIME", "ClientId", "Status",
            "AccountId",
        ],
    },
    CodePage {
        name: "Email2",
        tags: &[
            "UmCallerID", "UmUserNotes", "UmAttDuration", "UmAttOrder", "ConversationId",
            "ConversationIndex", "LastVerbExecuted", "LastVerbExecutionTime", "ReceivedAsBcc",
            "Sender", "CalendarType", "IsLeapMonth", "AccountId", "FirstDayOfWeek",
            "MeetingMessageType",
        ],
    },
    CodePage {
        name: "Notes",
        tags: &["Subject", "MessageClass", "LastModifiedDate", "Categories", "Category"],
    },
    CodePage {
        name: "RightsManagement",
        tags: &[
            "RightsManagementSupport", "RightsManagementTemplates", "RightsManagementTemplate",
            "RightsManagementLicense", "EditAllowed", "ReplyAllowed", "ReplyAllAllowed",
            "ForwardAllowed", "ModifyRecipientsAllowed", "ExtractAllowed", "PrintAllowed",
            "ExportAllowed", "ProgrammaticAccessAllowed", "Owner", "ContentExpiryDate",
            "TemplateID", "TemplateName", "TemplateDescription", "ContentOwner",
            "RemoveRightsManagementDistribution",
        ],
    },
];

const UNKNOWN_PREFIX: &str = "unknown-";

pub fn is_valid_page(page: u8) -> bool {
    (page as usize) < PAGES.len()
}

pub fn is_valid_tag(page: u8, index: u8) -> bool {
    is_valid_page(page)
        && index >= TAG_BASE
        && ((index - TAG_BASE) as usize) < PAGES[page as usize].tags.len()
}

/// True for indices reserved by WBXML for global tokens
pub fn is_global_tag(index: u8) -> bool {
    index < TAG_BASE
}

/// Symbolic name of a tag, or `"unknown"` when the page/index pair has none
pub fn tag_name(page: u8, index: u8) -> &'static str {
    if is_valid_tag(page, index) {
        PAGES[page as usize].tags[(index - TAG_BASE) as usize]
    } else {
        "unknown"
    }
}

pub fn page_name(page: u8) -> Option<&'static str> {
    PAGES.get(page as usize).map(|p| p.name)
}

pub const fn tag_number(page: u8, index: u8) -> u16 {
    ((page as u16) << PAGE_SHIFT) | (index & PAGE_MASK) as u16
}

pub const fn page_of(tag: u16) -> u8 {
    (tag >> PAGE_SHIFT) as u8
}

pub const fn index_of(tag: u16) -> u8 {
    (tag as u8) & PAGE_MASK
}

/// `Page:Tag` form used for XML element names.
///
/// Indices without a name render as `Page:unknown-XX`; tags on a page
/// outside the table render as `Page<n>:unknown-XX`.
pub fn qualified_name(tag: u16) -> String {
    let page = page_of(tag);
    let index = index_of(tag);
    let label = match page_name(page) {
        Some(name) => name.to_string(),
        None => format!("Page{}", page),
    };
    if is_valid_tag(page, index) {
        format!("{}:{}", label, tag_name(page, index))
    } else {
        format!("{}:{}{:02X}", label, UNKNOWN_PREFIX, index)
    }
}

/// Inverse of [`qualified_name`] for pages in the table
pub fn find(qualified: &str) -> Option<u16> {
    let (page_part, tag_part) = qualified.split_once(':')?;
    let page = PAGES.iter().position(|p| p.name == page_part)? as u8;

    if let Some(hex_index) = tag_part.strip_prefix(UNKNOWN_PREFIX) {
        let index = u8::from_str_radix(hex_index, 16).ok()?;
        if index > PAGE_MASK || is_global_tag(index) {
            return None;
        }
        return Some(tag_number(page, index));
    }

    PAGES[page as usize]
        .tags
        .iter()
        .position(|&name| name == tag_part)
        .map(|pos| tag_number(page, pos as u8 + TAG_BASE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages() {
        assert!(is_valid_page(AIRSYNC));
        assert!(is_valid_page(RIGHTS_MANAGEMENT));
        assert!(!is_valid_page(25));
        assert!(!is_valid_page(0x40));
        assert_eq!(page_name(FOLDER_HIERARCHY), Some("FolderHierarchy"));
        assert_eq!(page_name(25), None);
    }

    #[test]
    fn test_every_page_fits_in_six_bits() {
        for page in PAGES.iter() {
            assert!(page.tags.len() + TAG_BASE as usize <= PAGE_MASK as usize + 1, "{}", page.name);
        }
    }

    #[test]
    fn test_tag_names() {
        assert_eq!(tag_name(AIRSYNC, 0x05), "Sync");
        assert_eq!(tag_name(AIRSYNC, 0x0B), "SyncKey");
        assert_eq!(tag_name(AIRSYNC, 0x29), "HeartbeatInterval");
        assert_eq!(tag_name(EMAIL, 0x3F), "DisallowNewTimeProposal");
        assert_eq!(tag_name(FOLDER_HIERARCHY, 0x16), "FolderSync");
        assert_eq!(tag_name(PROVISION, 0x3B), "AccountOnlyRemoteWipe");
        assert_eq!(tag_name(AIRSYNC_BASE, 0x0A), "Body");
    }

    #[test]
    fn test_invalid_tags() {
        assert!(!is_valid_tag(AIRSYNC, 0x3F));
        assert!(!is_valid_tag(AIRSYNC, 0x04));
        assert!(!is_valid_tag(30, 0x05));
        assert_eq!(tag_name(AIRSYNC, 0x3F), "unknown");
    }

    #[test]
    fn test_global_tags() {
        for index in 0..TAG_BASE {
            assert!(is_global_tag(index));
        }
        assert!(!is_global_tag(TAG_BASE));
    }

    #[test]
    fn test_qualified_names() {
        let sync_key = tag_number(AIRSYNC, 0x0B);
        assert_eq!(qualified_name(sync_key), "AirSync:SyncKey");
        assert_eq!(find("AirSync:SyncKey"), Some(sync_key));

        let folder_sync = tag_number(FOLDER_HIERARCHY, 0x16);
        assert_eq!(folder_sync, (7 << 6) | 0x16);
        assert_eq!(qualified_name(folder_sync), "FolderHierarchy:FolderSync");
        assert_eq!(find("FolderHierarchy:FolderSync"), Some(folder_sync));
    }

    #[test]
    fn test_unknown_qualified_names() {
        let unknown = tag_number(AIRSYNC, 0x3F);
        assert_eq!(qualified_name(unknown), "AirSync:unknown-3F");
        assert_eq!(find("AirSync:unknown-3F"), Some(unknown));
        assert_eq!(find("AirSync:unknown-03"), None);
        assert_eq!(find("AirSync:NoSuchTag"), None);
        assert_eq!(find("NoSuchPage:Sync"), None);
        assert_eq!(find("Sync"), None);
    }

    #[test]
    fn test_same_name_on_different_pages() {
        let airsync_status = find("AirSync:Status").unwrap();
        let ping_status = find("Ping:Status").unwrap();
        assert_ne!(airsync_status, ping_status);
        assert_eq!(page_of(ping_status), PING);
        assert_eq!(index_of(ping_status), 0x07);
    }
}
